use clap::ValueEnum;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// CPU architecture a configure run targets.
///
/// `X86_64` configures natively; the others cross-compile through a toolchain
/// file shipped inside the source tree.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    #[value(name = "x86_64", alias = "amd64")]
    X86_64,
    #[value(name = "aarch64", alias = "arm64")]
    AArch64,
    #[value(name = "arm", alias = "armv7")]
    Arm,
    #[value(name = "riscv64", alias = "riscv")]
    RiscV64,
}

impl Target {
    pub const ALL: [Target; 4] = [Target::X86_64, Target::AArch64, Target::Arm, Target::RiscV64];

    pub fn name(&self) -> &'static str {
        match self {
            Target::X86_64 => "x86_64",
            Target::AArch64 => "aarch64",
            Target::Arm => "arm",
            Target::RiscV64 => "riscv64",
        }
    }

    /// Toolchain file relative to the source tree, if the target needs one.
    pub fn toolchain_file(&self) -> Option<&'static str> {
        match self {
            Target::X86_64 => None,
            Target::AArch64 => Some("platforms/linux/aarch64-gnu.toolchain.cmake"),
            Target::Arm => Some("platforms/linux/arm-gnueabi.toolchain.cmake"),
            Target::RiscV64 => Some("platforms/linux/riscv64-gcc.toolchain.cmake"),
        }
    }

    /// `-DCMAKE_TOOLCHAIN_FILE=...` for this target, resolved under `source`.
    pub fn toolchain_flag(&self, source: &Path) -> Option<String> {
        self.toolchain_file().map(|rel| {
            let path: PathBuf = source.join(rel);
            format!("-DCMAKE_TOOLCHAIN_FILE={}", path.display())
        })
    }

    /// Map a `uname -m` style name onto a target.
    pub fn from_arch_name(arch: &str) -> Option<Self> {
        let arch = arch.trim();
        if arch.contains("x86_64") || arch == "amd64" {
            Some(Target::X86_64)
        } else if arch.contains("aarch64") || arch.contains("arm64") {
            Some(Target::AArch64)
        } else if arch.starts_with("arm") {
            Some(Target::Arm)
        } else if arch.starts_with("riscv64") {
            Some(Target::RiscV64)
        } else {
            None
        }
    }

    /// Target matching the machine we run on. `ARCH` overrides detection.
    pub fn host() -> Option<Self> {
        Target::from_arch_name(&detect_arch())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn detect_arch() -> String {
    if let Ok(arch) = env::var("ARCH") {
        if !arch.trim().is_empty() {
            return arch;
        }
    }
    Command::new("uname")
        .arg("-m")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|_| env::consts::ARCH.to_string())
}
