//! Workload launcher for `burnio start`.
//!
//! The launcher resolves the device, detaches a worker process, waits one
//! grace interval and then decides from the probe state and the log artifact
//! whether the worker came up. Success only means the worker survived the
//! grace interval: a failure that happens later shows up in the log, not here.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::core::signature::{WORKER_SUBCOMMAND, artifact_dir_arg};
use crate::core::types::{WorkerState, WorkloadSpec};
use crate::error::LaunchError;
use crate::io::artifacts::ArtifactPaths;
use crate::io::channel::CommandChannel;
use crate::io::detach::{DetachRequest, Detacher, StartupProbe};
use crate::io::registry::ProcessRegistry;
use crate::resolve::resolve;
use crate::terminate::terminate;

/// Collaborators and settings for [`launch`].
pub struct LaunchContext<'a, C, D, R> {
    pub channel: &'a C,
    pub detacher: &'a D,
    pub registry: &'a R,
    pub paths: &'a ArtifactPaths,
    /// Binary to re-invoke as the detached worker.
    pub worker_program: PathBuf,
    /// Config file forwarded to the worker, if any.
    pub config_path: Option<PathBuf>,
    pub grace: Duration,
}

/// A worker that passed the startup check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub file_system: String,
}

/// Arguments for the detached `run-detached` invocation.
pub fn worker_args(
    spec: &WorkloadSpec,
    paths: &ArtifactPaths,
    config_path: Option<&std::path::Path>,
) -> Vec<String> {
    let mut args = vec![artifact_dir_arg(&paths.dir)];
    if let Some(config) = config_path {
        args.push(format!("--config={}", config.display()));
    }
    args.push(WORKER_SUBCOMMAND.to_string());
    args.push(format!("--file-system={}", spec.file_system));
    args.push(format!("--size={}", spec.block_size_mb));
    args.push(format!("--count={}", spec.block_count));
    if spec.read {
        args.push("--read".to_string());
    }
    if spec.write {
        args.push("--write".to_string());
    }
    args
}

/// Start the workload described by `spec` as a detached worker.
///
/// Any failure after the detach attempt runs the terminator first, so no
/// partial worker outlives a failed launch.
#[instrument(skip_all, fields(mount_point = %spec.mount_point))]
pub fn launch<C, D, R>(
    ctx: &LaunchContext<'_, C, D, R>,
    spec: &WorkloadSpec,
) -> Result<LaunchOutcome, LaunchError>
where
    C: CommandChannel,
    D: Detacher,
    R: ProcessRegistry,
{
    spec.validate().map_err(LaunchError::InvalidSpec)?;

    let mut spec = spec.clone();
    if spec.file_system.trim().is_empty() {
        spec.file_system = resolve(ctx.channel, &spec.mount_point)?;
    }

    let request = DetachRequest {
        program: ctx.worker_program.clone(),
        args: worker_args(&spec, ctx.paths, ctx.config_path.as_deref()),
        log_path: ctx.paths.log_path.clone(),
    };
    // Only errors written by this worker count; older lines belong to earlier runs.
    let log_offset = ctx.paths.log_len();

    let mut probe = match ctx.detacher.detach(&request) {
        Ok(probe) => probe,
        Err(err) => {
            let err = format!("{err:#}");
            warn!(%err, "detach failed, cleaning up");
            terminate(ctx.channel, ctx.registry, ctx.paths);
            return Err(LaunchError::Detach(err));
        }
    };

    let state = probe.wait(ctx.grace).unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "startup probe failed");
        WorkerState::Failed(format!("{err:#}"))
    });
    debug!(?state, "startup probe finished");

    let logged = ctx
        .paths
        .logged_errors_since(log_offset)
        .unwrap_or_else(|err| {
            warn!(err = %format!("{err:#}"), "could not read log artifact");
            None
        });

    let failure = match (logged, state) {
        (Some(message), _) => Some(message),
        (None, state) if state.is_running() => None,
        (None, WorkerState::Failed(reason)) => Some(reason),
        (None, _) => Some("worker was killed during startup".to_string()),
    };
    if let Some(message) = failure {
        warn!(%message, "worker failed during grace interval, cleaning up");
        terminate(ctx.channel, ctx.registry, ctx.paths);
        return Err(LaunchError::Startup(message));
    }

    info!(file_system = %spec.file_system, "workload started");
    Ok(LaunchOutcome {
        file_system: spec.file_system,
    })
}
