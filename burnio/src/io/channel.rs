//! Command channel: run an external program and report success plus output.
//!
//! Everything the controller does to the host (mount queries, `dd`, `rm`,
//! `kill`) goes through [`CommandChannel`], so tests can script the host with
//! a fake channel instead of spawning processes.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::io::config::BurnioConfig;
use crate::io::process::run_command;

/// Outcome of a single channel invocation. Consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    pub success: bool,
    /// Captured stdout.
    pub output: String,
    /// Failure description (stderr or a synthesized message). Empty on success.
    pub error: String,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: error.into(),
        }
    }
}

/// Abstraction over command execution backends.
pub trait CommandChannel {
    fn run(&self, program: &str, args: &[String]) -> CommandResult;
}

/// Channel that executes programs directly on the local host (no shell).
#[derive(Debug, Clone)]
pub struct LocalChannel {
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl LocalChannel {
    pub fn new(timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }

    pub fn from_config(cfg: &BurnioConfig) -> Self {
        Self::new(cfg.command_timeout(), cfg.output_limit_bytes)
    }
}

impl CommandChannel for LocalChannel {
    #[instrument(skip_all, fields(program = %program))]
    fn run(&self, program: &str, args: &[String]) -> CommandResult {
        debug!(?args, "running command");
        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = match run_command(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) => output,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "command could not run");
                return CommandResult::failed(format!("{program}: {err:#}"));
            }
        };

        let stdout = output.stdout.text();
        let stderr = output.stderr.text().trim().to_string();

        if output.timed_out {
            return CommandResult::failed(format!(
                "{program} timed out after {:?}",
                self.timeout.unwrap_or_default()
            ));
        }
        if !output.status.success() {
            debug!(exit_code = ?output.status.code(), "command failed");
            let error = if stderr.is_empty() {
                match output.status.code() {
                    Some(code) => format!("{program} exited with status {code}"),
                    None => format!("{program} terminated by signal"),
                }
            } else {
                stderr
            };
            return CommandResult::failed(error);
        }
        CommandResult::ok(stdout)
    }
}
