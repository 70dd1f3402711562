//! Built-in verification cases.
//!
//! Expectations track the CPU dispatch defaults of the configured source tree
//! for each architecture. Cross targets rely on the toolchain's default ISA,
//! so their baseline under `DETECT` is whatever that compiler enables.

use crate::extract::OutputSource;
use crate::record::FeatureRecord;
use crate::target::Target;

/// Dispatch list the x86-64 configuration generates code for by default.
pub const X86_DEFAULT_DISPATCH: &str = "SSE4_1 SSE4_2 AVX FP16 AVX2 AVX512_SKX";

/// One invoke-extract-compare cycle.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub target: Target,
    pub flags: Vec<String>,
    pub expected: FeatureRecord,
    pub source: OutputSource,
    /// Only meaningful on one particular build host (e.g. `NATIVE`).
    pub host_specific: bool,
}

impl Case {
    pub fn new(name: impl Into<String>, target: Target, expected: FeatureRecord) -> Self {
        Case {
            name: name.into(),
            target,
            flags: Vec::new(),
            expected,
            source: OutputSource::Console,
            host_specific: false,
        }
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn source(mut self, source: OutputSource) -> Self {
        self.source = source;
        self
    }

    pub fn host_specific(mut self) -> Self {
        self.host_specific = true;
        self
    }

    /// `target::name`, the identifier printed in reports.
    pub fn id(&self) -> String {
        format!("{}::{}", self.target, self.name)
    }
}

/// The full list of built-in cases, grouped by target.
pub fn builtin_cases() -> Vec<Case> {
    vec![
        Case::new(
            "default",
            Target::X86_64,
            FeatureRecord::expect("SSE SSE2 SSE3", "SSE3", "", X86_DEFAULT_DISPATCH),
        ),
        Case::new(
            "disable_sse2",
            Target::X86_64,
            FeatureRecord::expect("SSE", "SSE3", "SSE2", X86_DEFAULT_DISPATCH),
        )
        .flag("-DCPU_BASELINE_DISABLE=SSE2"),
        Case::new(
            "detect",
            Target::X86_64,
            FeatureRecord::expect("SSE SSE2", "DETECT", "", X86_DEFAULT_DISPATCH),
        )
        .flag("-DCPU_BASELINE=DETECT"),
        Case::new(
            "native",
            Target::X86_64,
            FeatureRecord::expect(
                "SSE SSE2 SSE3 SSSE3 SSE4_1 POPCNT SSE4_2 AVX FP16 AVX2 FMA3 AVX_512F \
                 AVX512_COMMON AVX512_SKX AVX512_CNL AVX512_CLX AVX512_ICL",
                "NATIVE",
                "",
                X86_DEFAULT_DISPATCH,
            ),
        )
        .flag("-DCPU_BASELINE=NATIVE")
        .host_specific(),
        Case::new(
            "default",
            Target::AArch64,
            FeatureRecord::expect("NEON FP16", "DETECT", "", ""),
        ),
        Case::new("default", Target::Arm, FeatureRecord::expect("", "DETECT", "", "")),
        Case::new(
            "default",
            Target::RiscV64,
            FeatureRecord::expect("", "DETECT", "", ""),
        ),
    ]
}

/// Narrow `cases` to the requested targets, names and host policy.
///
/// Empty `targets` or `names` means "all".
pub fn select(
    cases: Vec<Case>,
    targets: &[Target],
    names: &[String],
    include_host_specific: bool,
) -> Vec<Case> {
    cases
        .into_iter()
        .filter(|c| targets.is_empty() || targets.contains(&c.target))
        .filter(|c| names.is_empty() || names.iter().any(|n| *n == c.name || *n == c.id()))
        .filter(|c| include_host_specific || !c.host_specific)
        .collect()
}
