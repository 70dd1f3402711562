#![allow(dead_code)]

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cpu_dispatch_check::HarnessConfig;
use tempfile::TempDir;

/// Stand-in for `cmake` that prints a CPU/HW summary shaped like the real one.
///
/// Behaviour is selected through the arguments it receives:
/// toolchain files pick the architecture, `-DCPU_BASELINE*` flags adjust the
/// record, `FAIL_CONFIGURE` exits non-zero, `HANG` sleeps in place, `HANG_CHILD`
/// waits on a sleeping child process and `WRITE_VARS`
/// also writes a `CMakeCache.txt` into the working directory.
const FAKE_CMAKE: &str = r##"#!/bin/sh
args="$*"
echo "$args" >> invocation.log

case "$args" in
  *FAIL_CONFIGURE*)
    echo "-- Configuring incomplete, errors occurred!"
    echo "CMake Error: could not find toolchain" >&2
    exit 1;;
  *HANG_CHILD*)
    echo "-- Detecting CXX compiler ABI info"
    sleep 30
    exit 0;;
  *HANG*)
    exec sleep 30;;
esac

baseline="SSE SSE2 SSE3"
requested="SSE3"
disabled=""
dispatch="SSE4_1 SSE4_2 AVX FP16 AVX2 AVX512_SKX"

case "$args" in
  *CPU_BASELINE_DISABLE=SSE2*) baseline="SSE"; disabled="SSE2";;
  *CPU_BASELINE=DETECT*) baseline="SSE SSE2"; requested="DETECT";;
  *CPU_BASELINE=NATIVE*) baseline="SSE SSE2 SSE3 SSSE3"; requested="NATIVE";;
esac

case "$args" in
  *aarch64-gnu.toolchain*) baseline="NEON FP16"; requested="DETECT"; dispatch="";;
  *arm-gnueabi.toolchain*|*riscv64-gcc.toolchain*) baseline=""; requested="DETECT"; dispatch="";;
esac

case "$args" in
  *WRITE_VARS*)
    {
      echo "# This is the CMakeCache file."
      echo "CPU_BASELINE:STRING=$requested" | tr ' ' ';'
      echo "CPU_BASELINE_DISABLE:STRING=$disabled"
      echo "CPU_BASELINE_FINAL:INTERNAL=$baseline" | tr ' ' ';'
      echo "CPU_DISPATCH_FINAL:INTERNAL=$dispatch" | tr ' ' ';'
    } > CMakeCache.txt;;
esac

echo "-- The CXX compiler identification is GNU 12.2.0"
echo "--"
echo "-- General configuration for OpenCV 4.10.0 ====================================="
echo "--   Platform:"
echo "--     CMake generator:             Ninja"
echo "--"
echo "--   CPU/HW features:"
echo "--     Baseline:                    $baseline"
echo "--       requested:                 $requested"
if [ -n "$disabled" ]; then
  echo "--       disabled:                  $disabled"
fi
if [ -n "$dispatch" ]; then
  echo "--     Dispatched code generation:  $dispatch"
  echo "--       requested:                 $dispatch"
fi
echo "--"
echo "--   C/C++:"
echo "--     Built as dynamic libs?:      YES"
echo "--       requested:                 IGNORED"
echo "-- Configuring done"
"##;

/// A scratch source tree, build directory and fake configure tool.
pub struct Fixture {
    pub root: TempDir,
    pub source: PathBuf,
    pub build: PathBuf,
    pub tool: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let source = root.path().join("opencv");
        let build = root.path().join("build");
        fs::create_dir_all(source.join("platforms/linux")).expect("source tree");
        let tool = root.path().join("cmake");
        write_script(&tool, FAKE_CMAKE);
        Fixture {
            root,
            source,
            build,
            tool,
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::new(&self.source, &self.build).with_tool(&self.tool)
    }

    /// Arguments the fake tool saw on its most recent invocation.
    pub fn last_invocation(&self) -> String {
        fs::read_to_string(self.build.join("invocation.log"))
            .expect("invocation log")
            .lines()
            .last()
            .unwrap_or_default()
            .to_string()
    }
}

pub fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    fs::set_permissions(path, Permissions::from_mode(0o755)).expect("perm");
}
