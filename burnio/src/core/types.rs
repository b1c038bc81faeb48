//! Workload description and worker lifecycle states.

use std::fmt;

use thiserror::Error;

/// Parameters of one disk stress workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    /// Mount point the operator targets (e.g. `/`).
    pub mount_point: String,
    /// Device backing the mount point (e.g. `/dev/vda1`). Empty until resolved.
    pub file_system: String,
    /// Block size in megabytes for each `dd` operation.
    pub block_size_mb: u64,
    /// Number of blocks per `dd` operation.
    pub block_count: u64,
    pub read: bool,
    pub write: bool,
}

impl WorkloadSpec {
    /// Check the parts of the workload that do not depend on the host.
    ///
    /// The file system may still be empty here; the launcher resolves it.
    pub fn validate(&self) -> Result<(), String> {
        if !self.read && !self.write {
            return Err("at least one of --read or --write is required".to_string());
        }
        if self.block_size_mb == 0 {
            return Err("size must be > 0".to_string());
        }
        if self.block_count == 0 {
            return Err("count must be > 0".to_string());
        }
        Ok(())
    }

    /// Megabytes moved by a single stress operation.
    pub fn megabytes_per_op(&self) -> u64 {
        self.block_size_mb.saturating_mul(self.block_count)
    }
}

/// The two independent stress loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StressTask {
    Read,
    Write,
}

impl StressTask {
    pub fn as_str(self) -> &'static str {
        match self {
            StressTask::Read => "read",
            StressTask::Write => "write",
        }
    }
}

impl fmt::Display for StressTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stress loop hit a failing I/O operation. Fatal to the worker process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct WorkerFailure {
    pub task: StressTask,
    pub reason: String,
}

impl WorkerFailure {
    pub fn new(task: StressTask, reason: impl Into<String>) -> Self {
        Self {
            task,
            reason: reason.into(),
        }
    }
}

/// Lifecycle of a stress worker, as seen by its supervisor or launcher.
///
/// `Running` is the only non-terminal state. A worker never returns to
/// `Running` once it has failed or been killed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    /// A loop reported a failure, or the process exited on its own.
    Failed(String),
    /// The process was killed from outside.
    Terminated,
}

impl WorkerState {
    pub fn is_running(&self) -> bool {
        matches!(self, WorkerState::Running)
    }
}
