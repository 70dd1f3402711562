//! The invoke, extract, compare cycle.

use std::fmt;
use std::time::{Duration, Instant};

use crate::compare::{compare, CompareMode};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::extract::{self, Extracted, OutputSource};
use crate::invoker::run_configure;
use crate::record::FeatureRecord;
use crate::suite::Case;
use crate::workdir::wipe_dir;

/// Runs cases against one source tree and build directory.
#[derive(Debug, Clone)]
pub struct Harness {
    cfg: HarnessConfig,
    mode: CompareMode,
}

impl Harness {
    /// Validate `cfg` and make sure the build directory exists.
    ///
    /// Environment problems surface here, before any case runs.
    pub fn new(cfg: HarnessConfig) -> Result<Self> {
        cfg.validate()?;
        wipe_dir(&cfg.build_dir)?;
        Ok(Harness {
            cfg,
            mode: CompareMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.cfg
    }

    /// Configure for `case` and parse its features, without comparing.
    pub fn extract(&self, case: &Case) -> Result<Extracted> {
        let run = run_configure(&self.cfg, case.target, &case.flags)?;
        run.ensure_success()?;
        match &case.source {
            OutputSource::Console => Ok(extract::parse_console(&run.stdout_str())),
            OutputSource::VarFile { file_name, names } => {
                extract::read_var_file(&self.cfg.build_dir.join(file_name), names)
            }
        }
    }

    /// Run `case` and compare its record against the expectation.
    pub fn check(&self, case: &Case) -> Result<FeatureRecord> {
        let Extracted { record, raw } = self.extract(case)?;
        compare(&record, &case.expected, self.mode)
            .map_err(|mismatch| HarnessError::Mismatch { mismatch, raw })?;
        Ok(record)
    }

    /// Run every case in order. A failing case never stops the others.
    pub fn run_all(&self, cases: &[Case]) -> Report {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            log::info!("running {}", case.id());
            let start = Instant::now();
            let outcome = match self.check(case) {
                Ok(record) => Outcome::Passed(record),
                Err(e) => Outcome::Failed(e),
            };
            let elapsed = start.elapsed();
            match &outcome {
                Outcome::Passed(_) => log::info!("{} ok ({:.2?})", case.id(), elapsed),
                Outcome::Failed(e) => log::error!("{} FAILED: {}", case.id(), first_line(e)),
            }
            results.push(CaseResult {
                id: case.id(),
                outcome,
                elapsed,
            });
        }
        Report { results }
    }
}

fn first_line(e: &HarnessError) -> String {
    e.to_string().lines().next().unwrap_or_default().to_string()
}

#[derive(Debug)]
pub enum Outcome {
    Passed(FeatureRecord),
    Failed(HarnessError),
}

#[derive(Debug)]
pub struct CaseResult {
    pub id: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed(_))
    }
}

/// Per-case outcomes of a run, in execution order.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<CaseResult>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Process exit code: 0 when everything passed.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.results {
            let verdict = if r.passed() { "ok" } else { "FAIL" };
            writeln!(f, "{} ... {}", r.id, verdict)?;
        }
        for r in &self.results {
            if let Outcome::Failed(e) = &r.outcome {
                writeln!(f, "\n==== FAIL: {}\n{}", r.id, e)?;
            }
        }
        let total: Duration = self.results.iter().map(|r| r.elapsed).sum();
        writeln!(
            f,
            "\nRan {} cases in {:.3}s: {} passed, {} failed",
            self.results.len(),
            total.as_secs_f64(),
            self.passed(),
            self.failed()
        )
    }
}
