// src/fs/mod.rs

//! Temporary build artifacts on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Owns a set of files and removes them when dropped.
///
/// One guard is created per `compile_and_run` call and moved into whichever
/// task ends the lifecycle (the compile waiter on failure, the run waiter
/// otherwise), so removal happens on every exit path.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard that tracks paths but never deletes them.
    pub fn keep_on_drop() -> Self {
        Self {
            paths: Vec::new(),
            keep: true,
        }
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            debug!(paths = ?self.paths, "keeping artifacts");
            return;
        }
        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = ?path, "removed artifact"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?path, error = %e, "failed to remove artifact"),
            }
        }
    }
}

/// Write in-memory source code to `dir/file_name`, creating `dir` if needed.
pub fn write_source(dir: &Path, file_name: &str, code: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, code)?;
    debug!(path = ?path, bytes = code.len(), "wrote source file");
    Ok(path)
}
