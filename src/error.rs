use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::compare::Mismatch;

/// Errors raised while configuring, running, or checking a case.
#[derive(Debug)]
pub enum HarnessError {
    /// A required environment variable was not set.
    MissingEnv(&'static str),
    /// An environment variable was set to something unusable.
    InvalidEnv { var: &'static str, value: String },
    /// The source tree does not exist.
    SourceNotFound(PathBuf),
    /// Filesystem failure on the working directory or an artifact.
    Io { path: PathBuf, source: io::Error },
    /// The configure tool could not be started.
    Spawn(io::Error),
    /// The configure tool exited unsuccessfully.
    ConfigureFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The configure tool was killed after exceeding the deadline.
    Timeout(Duration),
    /// A successful run did not leave the expected variable file behind.
    MissingArtifact(PathBuf),
    /// Extracted features differ from the expectation.
    Mismatch { mismatch: Mismatch, raw: String },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that mean no case can run at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::MissingEnv(_)
                | HarnessError::InvalidEnv { .. }
                | HarnessError::SourceNotFound(_)
        )
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::MissingEnv(var) => {
                write!(f, "required environment variable {var} is not set")
            }
            HarnessError::InvalidEnv { var, value } => {
                write!(f, "invalid value for {var}: {value:?}")
            }
            HarnessError::SourceNotFound(path) => {
                write!(f, "source tree does not exist: {}", path.display())
            }
            HarnessError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            HarnessError::Spawn(e) => write!(f, "failed to spawn configure tool: {e}"),
            HarnessError::ConfigureFailed {
                code,
                stdout,
                stderr,
            } => write!(
                f,
                "configure failed with exit code: {code:?}\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}"
            ),
            HarnessError::Timeout(limit) => {
                write!(f, "configure did not finish within {}s", limit.as_secs())
            }
            HarnessError::MissingArtifact(path) => {
                write!(f, "expected variable file not found: {}", path.display())
            }
            HarnessError::Mismatch { mismatch, raw } => write!(
                f,
                "{mismatch}\nResults are different, actual raw output:\n{raw}\n"
            ),
        }
    }
}

impl Error for HarnessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HarnessError::Io { source, .. } => Some(source),
            HarnessError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
