//! Stress worker: the infinite read/write loops and their supervisor.
//!
//! Each loop blocks on one `dd` at a time and repeats until an operation
//! fails. The loops have no cancellation check; they stop when the process is
//! killed or when the first failure ends the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, trace};

use crate::core::dd::{DD, read_args, write_args};
use crate::core::types::{StressTask, WorkerFailure, WorkerState, WorkloadSpec};
use crate::io::artifacts::ArtifactPaths;
use crate::io::channel::CommandChannel;

pub const RM: &str = "rm";

/// One write iteration: synchronous `dd` into the scratch file, then delete it.
///
/// The scratch file is removed even when `dd` fails; the `dd` error wins.
pub fn write_step<C: CommandChannel>(
    channel: &C,
    scratch: &Path,
    block_size_mb: u64,
    block_count: u64,
) -> Result<(), WorkerFailure> {
    let written = channel.run(DD, &write_args(scratch, block_size_mb, block_count));
    let removed = channel.run(RM, &["-f".to_string(), scratch.display().to_string()]);
    if !written.success {
        return Err(WorkerFailure::new(StressTask::Write, written.error));
    }
    if !removed.success {
        return Err(WorkerFailure::new(StressTask::Write, removed.error));
    }
    Ok(())
}

/// One read iteration: direct `dd` from the device into `/dev/null`.
pub fn read_step<C: CommandChannel>(
    channel: &C,
    file_system: &str,
    block_size_mb: u64,
    block_count: u64,
) -> Result<(), WorkerFailure> {
    let response = channel.run(DD, &read_args(file_system, block_size_mb, block_count));
    if !response.success {
        return Err(WorkerFailure::new(
            StressTask::Read,
            format!(
                "The file system named {file_system} is not supported or {}",
                response.error
            ),
        ));
    }
    Ok(())
}

/// Repeat [`write_step`] until it fails. Returns only the failure that ended it.
#[instrument(skip(channel))]
pub fn run_write_loop<C: CommandChannel>(
    channel: &C,
    scratch: &Path,
    block_size_mb: u64,
    block_count: u64,
) -> WorkerFailure {
    let mut iterations = 0u64;
    loop {
        if let Err(failure) = write_step(channel, scratch, block_size_mb, block_count) {
            error!(iterations, reason = %failure.reason, "write loop failed");
            return failure;
        }
        iterations += 1;
        trace!(iterations, "write iteration done");
    }
}

/// Repeat [`read_step`] until it fails. Returns only the failure that ended it.
#[instrument(skip(channel))]
pub fn run_read_loop<C: CommandChannel>(
    channel: &C,
    file_system: &str,
    block_size_mb: u64,
    block_count: u64,
) -> WorkerFailure {
    let mut iterations = 0u64;
    loop {
        if let Err(failure) = read_step(channel, file_system, block_size_mb, block_count) {
            error!(iterations, reason = %failure.reason, "read loop failed");
            return failure;
        }
        iterations += 1;
        trace!(iterations, "read iteration done");
    }
}

/// Run the requested loops concurrently and block until one of them fails.
///
/// Returns `Failed` after writing the failure to the log artifact. The caller
/// ends the process, which also stops the other loop. On success this never
/// returns. A workload rejected before any loop starts is recorded the same way.
#[instrument(skip_all, fields(file_system = %spec.file_system, read = spec.read, write = spec.write))]
pub fn supervise<C>(
    channel: Arc<C>,
    paths: &ArtifactPaths,
    spec: &WorkloadSpec,
) -> Result<WorkerState>
where
    C: CommandChannel + Send + Sync + 'static,
{
    if let Err(reason) = check_workload(spec) {
        error!(%reason, "workload rejected");
        paths
            .append_error(&reason)
            .context("record rejected workload")?;
        return Ok(WorkerState::Failed(reason));
    }

    let (tx, rx) = mpsc::channel::<WorkerFailure>();

    if spec.read {
        let channel = Arc::clone(&channel);
        let tx = tx.clone();
        let file_system = spec.file_system.clone();
        let (size, count) = (spec.block_size_mb, spec.block_count);
        thread::Builder::new()
            .name("burnio-read".to_string())
            .spawn(move || {
                let failure = run_read_loop(channel.as_ref(), &file_system, size, count);
                let _ = tx.send(failure);
            })
            .context("spawn read loop")?;
    }
    if spec.write {
        let channel = Arc::clone(&channel);
        let tx = tx.clone();
        let scratch: PathBuf = paths.scratch_path.clone();
        let (size, count) = (spec.block_size_mb, spec.block_count);
        thread::Builder::new()
            .name("burnio-write".to_string())
            .spawn(move || {
                let failure = run_write_loop(channel.as_ref(), &scratch, size, count);
                let _ = tx.send(failure);
            })
            .context("spawn write loop")?;
    }
    drop(tx);

    info!(mb_per_op = spec.megabytes_per_op(), "stress loops running");
    let reason = match rx.recv() {
        Ok(failure) => {
            debug!(task = %failure.task, "first failure received");
            failure.to_string()
        }
        // Every loop thread is gone without reporting: they panicked.
        Err(_) => "stress loops exited unexpectedly".to_string(),
    };

    paths
        .append_error(&reason)
        .context("record worker failure")?;
    Ok(WorkerState::Failed(reason))
}

fn check_workload(spec: &WorkloadSpec) -> Result<(), String> {
    spec.validate().map_err(|err| format!("invalid workload: {err}"))?;
    if spec.read && spec.file_system.trim().is_empty() {
        return Err("file system must be set for read stress".to_string());
    }
    Ok(())
}
