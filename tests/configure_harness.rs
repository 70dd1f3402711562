#![cfg(unix)]

mod common;

use std::fs;
use std::time::{Duration, Instant};

use common::Fixture;
use cpu_dispatch_check::invoker::{configure_command, run_configure};
use cpu_dispatch_check::suite::{self, Case};
use cpu_dispatch_check::{
    BaselineMode, CompareMode, FeatureList, FeatureRecord, Harness, HarnessConfig, HarnessError,
    OutputSource, Outcome, Requested, Target,
};

fn harness(fx: &Fixture) -> Harness {
    Harness::new(fx.config()).expect("harness")
}

#[test]
fn builtin_suite_passes_against_reference_output() {
    let fx = Fixture::new();
    let cases = suite::select(suite::builtin_cases(), &[], &[], false);
    let report = harness(&fx).run_all(&cases);
    assert!(report.all_passed(), "{report}");
    assert_eq!(report.results.len(), 6);
}

#[test]
fn default_x86_record() {
    let fx = Fixture::new();
    let case = Case::new("default", Target::X86_64, FeatureRecord::default());
    let extracted = harness(&fx).extract(&case).unwrap();
    assert_eq!(
        extracted.record,
        FeatureRecord::expect(
            "SSE;SSE2;SSE3",
            "SSE3",
            "",
            "SSE4_1;SSE4_2;AVX;FP16;AVX2;AVX512_SKX"
        )
    );
    assert_eq!(
        fx.last_invocation(),
        format!("-GNinja {}", fx.source.display())
    );
}

#[test]
fn cross_target_passes_toolchain_file() {
    let fx = Fixture::new();
    let case = Case::new("default", Target::AArch64, FeatureRecord::default());
    let record = harness(&fx).extract(&case).unwrap().record;
    assert_eq!(record.requested, Requested::Mode(BaselineMode::Detect));
    assert!(record.dispatched.is_empty());
    let seen = fx.last_invocation();
    assert!(
        seen.contains("-DCMAKE_TOOLCHAIN_FILE=")
            && seen.contains("platforms/linux/aarch64-gnu.toolchain.cmake"),
        "toolchain flag missing: {seen}"
    );
}

#[test]
fn disabling_sse2_shrinks_baseline() {
    let fx = Fixture::new();
    let case = Case::new("disable", Target::X86_64, FeatureRecord::default())
        .flag("-DCPU_BASELINE_DISABLE=SSE2");
    let record = harness(&fx).extract(&case).unwrap().record;
    assert_eq!(record.disabled, FeatureList::parse("SSE2"));
    assert_eq!(record.baseline, FeatureList::parse("SSE"));
}

#[test]
fn repeated_runs_are_deterministic() {
    let fx = Fixture::new();
    let h = harness(&fx);
    for case in suite::select(suite::builtin_cases(), &[], &[], true) {
        let first = h.extract(&case).unwrap().record;
        let second = h.extract(&case).unwrap().record;
        assert_eq!(first, second, "{} differs between runs", case.id());
    }
}

#[test]
fn stale_build_contents_are_wiped() {
    let fx = Fixture::new();
    let h = harness(&fx);
    fs::write(fx.build.join("CMakeCache.txt"), "CPU_BASELINE_FINAL=BOGUS\n").unwrap();
    fs::create_dir_all(fx.build.join("CMakeFiles")).unwrap();

    let case = Case::new("default", Target::X86_64, FeatureRecord::default());
    h.extract(&case).unwrap();

    assert!(!fx.build.join("CMakeCache.txt").exists());
    assert!(!fx.build.join("CMakeFiles").exists());
    assert!(fx.build.join("invocation.log").exists());
}

#[test]
fn mismatch_carries_raw_section() {
    let fx = Fixture::new();
    let case = Case::new(
        "wrong",
        Target::X86_64,
        FeatureRecord::expect("SSE", "SSE3", "", "AVX"),
    );
    match harness(&fx).check(&case) {
        Err(HarnessError::Mismatch { mismatch, raw }) => {
            assert_eq!(mismatch.diffs.len(), 2);
            assert!(raw.contains("Baseline:"));
            assert!(!raw.contains("Built as dynamic libs"));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn unordered_mode_tolerates_reordering() {
    let fx = Fixture::new();
    let case = Case::new(
        "reordered",
        Target::X86_64,
        FeatureRecord::expect("SSE3 SSE2 SSE", "SSE3", "", suite::X86_DEFAULT_DISPATCH),
    );
    assert!(harness(&fx).check(&case).is_err());
    let h = harness(&fx).with_mode(CompareMode::Unordered);
    assert!(h.check(&case).is_ok());
}

#[test]
fn configure_failure_is_reported_with_output() {
    let fx = Fixture::new();
    let case = Case::new("broken", Target::X86_64, FeatureRecord::default()).flag("FAIL_CONFIGURE");
    match harness(&fx).check(&case) {
        Err(HarnessError::ConfigureFailed {
            code,
            stdout,
            stderr,
        }) => {
            assert_eq!(code, Some(1));
            assert!(stdout.contains("Configuring incomplete"));
            assert!(stderr.contains("could not find toolchain"));
        }
        other => panic!("expected configure failure, got {other:?}"),
    }
}

#[test]
fn failing_case_does_not_stop_the_run() {
    let fx = Fixture::new();
    let ok = Case::new(
        "default",
        Target::X86_64,
        FeatureRecord::expect("SSE SSE2 SSE3", "SSE3", "", suite::X86_DEFAULT_DISPATCH),
    );
    let broken = Case::new("broken", Target::X86_64, FeatureRecord::default()).flag("FAIL_CONFIGURE");
    let report = harness(&fx).run_all(&[broken, ok]);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.results[0].outcome, Outcome::Failed(_)));
    assert!(matches!(report.results[1].outcome, Outcome::Passed(_)));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn var_file_source_reads_generated_dump() {
    let fx = Fixture::new();
    let case = Case::new(
        "vars",
        Target::X86_64,
        FeatureRecord::expect("SSE;SSE2", "DETECT", "", suite::X86_DEFAULT_DISPATCH),
    )
    .flag("-DCPU_BASELINE=DETECT")
    .flag("WRITE_VARS")
    .source(OutputSource::var_file("CMakeCache.txt"));
    let record = harness(&fx).check(&case).unwrap();
    assert_eq!(record.requested, Requested::Mode(BaselineMode::Detect));
}

#[test]
fn var_file_missing_after_success() {
    let fx = Fixture::new();
    let case = Case::new("vars", Target::X86_64, FeatureRecord::default())
        .source(OutputSource::var_file("cpu_features.txt"));
    assert!(matches!(
        harness(&fx).check(&case),
        Err(HarnessError::MissingArtifact(_))
    ));
}

#[test]
fn missing_tool_is_a_spawn_error() {
    let fx = Fixture::new();
    let cfg = fx.config().with_tool(fx.root.path().join("no-such-cmake"));
    let err = run_configure(&cfg, Target::X86_64, &[]).unwrap_err();
    assert!(matches!(err, HarnessError::Spawn(_)));
}

#[test]
fn timeout_kills_hung_configure() {
    let fx = Fixture::new();
    let cfg = fx.config().with_timeout(Some(Duration::from_secs(1)));
    let err = run_configure(&cfg, Target::X86_64, &["HANG".to_string()]).unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_)));
}

#[test]
fn timeout_kills_configure_with_running_children() {
    let fx = Fixture::new();
    let cfg = fx.config().with_timeout(Some(Duration::from_secs(1)));
    let start = Instant::now();
    let err = run_configure(&cfg, Target::X86_64, &["HANG_CHILD".to_string()]).unwrap_err();
    let took = start.elapsed();
    assert!(matches!(err, HarnessError::Timeout(_)));
    assert!(
        took < Duration::from_secs(10),
        "timeout waited for the child's sleep: {took:?}"
    );
}

#[test]
fn timeout_does_not_affect_fast_runs() {
    let fx = Fixture::new();
    let cfg = fx.config().with_timeout(Some(Duration::from_secs(20)));
    let run = run_configure(&cfg, Target::X86_64, &[]).unwrap();
    assert!(run.success());
    assert!(run.stdout_str().contains("CPU/HW features:"));
}

#[test]
fn command_runs_inside_build_dir() {
    let fx = Fixture::new();
    let cfg: HarnessConfig = fx.config();
    let cmd = configure_command(&cfg, Target::Arm, &[]);
    assert_eq!(cmd.get_current_dir(), Some(fx.build.as_path()));
}
