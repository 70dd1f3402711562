//! Scratch directory handling.
//!
//! Every configure run starts from an empty build directory. The wipe is a
//! standalone function so it can be exercised without spawning anything.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};

/// Remove everything inside `dir`, creating it if it does not exist.
///
/// The directory itself is kept so that paths handed out earlier stay valid.
pub fn wipe_dir(dir: &Path) -> Result<()> {
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|e| HarnessError::io(&path, e))?;
                let removed = if file_type.is_dir() {
                    fs::remove_dir_all(&path)
                } else {
                    fs::remove_file(&path)
                };
                removed.map_err(|e| HarnessError::io(&path, e))?;
            }
            log::debug!("wiped {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;
            log::debug!("created {}", dir.display());
            Ok(())
        }
        Err(e) => Err(HarnessError::io(dir, e)),
    }
}

/// A build directory that was emptied when acquired.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Wipe (or create) `path` and hand it out for one run.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        wipe_dir(&path)?;
        Ok(WorkDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file produced inside the directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
