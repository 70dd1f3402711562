use cpu_dispatch_check::Target;
use std::env;
use std::process::Command;

/// Options derived from the host machine used to drive the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Host target, if the checker knows it.
    pub target: Option<Target>,
    /// Extra arguments appended to `cpu-dispatch-check run`.
    pub extra_args: Vec<String>,
}

impl CheckConfig {
    /// Arguments for the `run` subcommand.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string()];
        if let Some(t) = self.target {
            args.push("--target".into());
            args.push(t.name().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Detect the check configuration from the current machine.
///
/// `ARCH` overrides the detected architecture; `CPU_CHECK_ARGS` adds
/// arguments to the run.
pub fn detect_config() -> CheckConfig {
    let extra = env::var("CPU_CHECK_ARGS").unwrap_or_default();
    compute_config(Target::host(), &extra)
}

/// Compute a [`CheckConfig`] from supplied inputs. This is separated for testing.
pub fn compute_config(target: Option<Target>, extra: &str) -> CheckConfig {
    CheckConfig {
        target,
        extra_args: extra.split_whitespace().map(str::to_string).collect(),
    }
}

pub fn build_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["build", "--workspace"]);
    cmd
}

pub fn test_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["test", "--workspace"]);
    cmd
}

pub fn clippy_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["clippy", "--all-targets", "--all-features"]);
    cmd
}

pub fn fmt_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["fmt", "--all"]);
    cmd
}

/// `cargo run` the checker for the detected host target.
pub fn check_command(cfg: &CheckConfig) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--release", "--bin", "cpu-dispatch-check", "--"]);
    cmd.args(cfg.run_args());
    cmd
}

/// `cargo run` the checker for every target in turn.
pub fn check_all_command(cfg: &CheckConfig) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--release", "--bin", "cpu-dispatch-check", "--", "run"]);
    cmd.args(&cfg.extra_args);
    cmd
}
