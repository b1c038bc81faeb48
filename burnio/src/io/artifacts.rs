//! Log artifact and scratch file of one workload namespace.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::error_log::{find_errors, format_error_line};

pub const LOG_FILE_NAME: &str = "chaos_burnio.log";
pub const SCRATCH_FILE_NAME: &str = "chaos_burnio.log.dat";

/// Canonical artifact paths under one directory.
///
/// Passed to every component so parallel instances (and tests) never share files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub log_path: PathBuf,
    pub scratch_path: PathBuf,
}

impl ArtifactPaths {
    /// `dir` is made absolute and stripped of trailing `/`, so `start` and
    /// `stop` agree on the worker signature however the directory was typed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = normalize_dir(dir.into());
        Self {
            log_path: dir.join(LOG_FILE_NAME),
            scratch_path: dir.join(SCRATCH_FILE_NAME),
            dir,
        }
    }

    /// Append one `Error: ...` line to the log.
    pub fn append_error(&self, message: &str) -> Result<()> {
        let mut file = open_append(&self.log_path)?;
        file.write_all(format_error_line(message).as_bytes())
            .with_context(|| format!("append to log {}", self.log_path.display()))
    }

    /// Current log size in bytes, zero when the log does not exist.
    pub fn log_len(&self) -> u64 {
        fs::metadata(&self.log_path).map(|m| m.len()).unwrap_or(0)
    }

    /// Error messages recorded in the log. A missing log has none.
    pub fn logged_errors(&self) -> Result<Option<String>> {
        self.logged_errors_since(0)
    }

    /// Error messages recorded after byte `offset` of the log.
    pub fn logged_errors_since(&self, offset: u64) -> Result<Option<String>> {
        let bytes = match fs::read(&self.log_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read log {}", self.log_path.display()));
            }
        };
        // A shorter log than `offset` was truncated or replaced; scan all of it.
        let start = usize::try_from(offset)
            .ok()
            .filter(|start| *start <= bytes.len())
            .unwrap_or(0);
        Ok(find_errors(&String::from_utf8_lossy(&bytes[start..])))
    }

    /// Best-effort removal of the log and scratch files. Never fails.
    pub fn remove_all(&self) {
        remove_quietly(&self.log_path);
        remove_quietly(&self.scratch_path);
    }
}

/// Open `path` for appending, creating it (and its directory) if needed.
pub fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create artifact dir {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log {}", path.display()))
}

fn normalize_dir(dir: PathBuf) -> PathBuf {
    let dir = std::path::absolute(&dir).unwrap_or(dir);
    dir.components().collect()
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed artifact"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), err = %err, "failed to remove artifact"),
    }
}
