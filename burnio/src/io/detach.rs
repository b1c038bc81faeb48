//! Detached worker launch and the startup probe.
//!
//! The worker runs in its own process group with stdout/stderr appended to the
//! log artifact, so it keeps running after the launcher exits. The probe holds
//! the child handle only long enough to notice an early exit.

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};
use wait_timeout::ChildExt;

use crate::core::types::WorkerState;
use crate::io::artifacts::open_append;

/// Parameters for a detached invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Log artifact receiving the child's stdout and stderr.
    pub log_path: PathBuf,
}

/// Reports what a freshly detached worker did during the grace interval.
pub trait StartupProbe {
    /// Wait up to `grace` for the worker to exit. `Running` when it did not.
    fn wait(&mut self, grace: Duration) -> Result<WorkerState>;
}

/// Abstraction over detached process backends.
pub trait Detacher {
    type Probe: StartupProbe;

    /// Start the worker and return immediately.
    fn detach(&self, request: &DetachRequest) -> Result<Self::Probe>;
}

/// Detacher that spawns a local process in a new process group.
#[derive(Debug, Clone, Default)]
pub struct LocalDetacher;

impl Detacher for LocalDetacher {
    type Probe = ChildProbe;

    #[instrument(skip_all, fields(program = %request.program.display()))]
    fn detach(&self, request: &DetachRequest) -> Result<ChildProbe> {
        let log = open_append(&request.log_path)?;
        let log_err = log.try_clone().context("clone log handle")?;

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .process_group(0);

        debug!(args = ?request.args, "spawning detached worker");
        let child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", request.program.display()))?;
        info!(pid = child.id(), "detached worker started");
        Ok(ChildProbe { child })
    }
}

/// Probe over the spawned child. Dropping it leaves the worker running.
#[derive(Debug)]
pub struct ChildProbe {
    child: Child,
}

impl StartupProbe for ChildProbe {
    fn wait(&mut self, grace: Duration) -> Result<WorkerState> {
        let status = self
            .child
            .wait_timeout(grace)
            .context("wait for detached worker")?;
        let Some(status) = status else {
            return Ok(WorkerState::Running);
        };
        debug!(exit_code = ?status.code(), signal = ?status.signal(), "worker exited during grace interval");
        if status.signal().is_some() {
            return Ok(WorkerState::Terminated);
        }
        let reason = match status.code() {
            Some(code) => format!("worker exited with status {code}"),
            None => "worker exited".to_string(),
        };
        Ok(WorkerState::Failed(reason))
    }
}
