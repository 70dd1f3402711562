use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, Result};

/// Environment variable naming the source tree to configure.
pub const SOURCE_ENV: &str = "OPENCV";
/// Environment variable naming the scratch build directory.
pub const BUILD_ENV: &str = "BUILD";
pub const TOOL_ENV: &str = "CPU_CHECK_CONFIGURE_TOOL";
pub const GENERATOR_ENV: &str = "CPU_CHECK_GENERATOR";
pub const TIMEOUT_ENV: &str = "CPU_CHECK_TIMEOUT_SECS";

pub const DEFAULT_TOOL: &str = "cmake";
pub const DEFAULT_GENERATOR: &str = "-GNinja";

/// Everything the invoker needs to know about where and how to configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Source tree passed as the final positional argument.
    pub source_dir: PathBuf,
    /// Working directory; wiped before every run.
    pub build_dir: PathBuf,
    /// Configure executable, `cmake` unless overridden.
    pub configure_tool: PathBuf,
    /// Generator flag, `-GNinja` unless overridden.
    pub generator: String,
    /// Kill the configure step after this long. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl HarnessConfig {
    /// Config with default tool, generator and no timeout.
    pub fn new(source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        HarnessConfig {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            configure_tool: PathBuf::from(DEFAULT_TOOL),
            generator: DEFAULT_GENERATOR.to_string(),
            timeout: None,
        }
    }

    /// Read the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Separated for testing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(HarnessError::MissingEnv(var))
        };
        let source = required(SOURCE_ENV)?;
        let build = required(BUILD_ENV)?;

        let mut cfg = HarnessConfig::new(source, build);
        if let Some(tool) = lookup(TOOL_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.configure_tool = PathBuf::from(tool);
        }
        if let Some(generator) = lookup(GENERATOR_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.generator = generator;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| HarnessError::InvalidEnv {
                    var: TIMEOUT_ENV,
                    value: raw.clone(),
                })?;
            cfg.timeout = Some(Duration::from_secs(secs));
        }
        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.configure_tool = tool.into();
        self
    }

    /// Fail fast when the source tree is missing.
    pub fn validate(&self) -> Result<()> {
        if !self.source_dir.is_dir() {
            return Err(HarnessError::SourceNotFound(self.source_dir.clone()));
        }
        Ok(())
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }
}
