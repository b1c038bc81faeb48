//! Child process execution with capped output capture.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Bytes kept from one output stream, plus how many were dropped past the cap.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub dropped: usize,
}

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn push(&mut self, chunk: &[u8], cap: usize) {
        let room = cap.saturating_sub(self.bytes.len()).min(chunk.len());
        self.bytes.extend_from_slice(&chunk[..room]);
        self.dropped += chunk.len() - room;
    }
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    /// The child was killed because it outlived the timeout.
    pub timed_out: bool,
}

/// Run `cmd` to completion with stdin closed.
///
/// Both pipes are drained on their own threads while the child runs, so a
/// chatty `dd` cannot block on a full pipe. Each stream keeps at most
/// `cap_bytes`. `timeout = None` waits as long as the child runs.
#[instrument(skip_all, fields(timeout_ms = timeout.map(|t| t.as_millis() as u64), cap_bytes))]
pub fn run_command(
    mut cmd: Command,
    timeout: Option<Duration>,
    cap_bytes: usize,
) -> Result<ProcessOutput> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn command")?;

    let stdout = drain(child.stdout.take(), cap_bytes)?;
    let stderr = drain(child.stderr.take(), cap_bytes)?;
    let (status, timed_out) = wait_bounded(&mut child, timeout)?;

    let output = ProcessOutput {
        status,
        stdout: collect(stdout).context("collect stdout")?,
        stderr: collect(stderr).context("collect stderr")?,
        timed_out,
    };
    if output.stdout.dropped > 0 || output.stderr.dropped > 0 {
        warn!(
            stdout_dropped = output.stdout.dropped,
            stderr_dropped = output.stderr.dropped,
            "output capped"
        );
    }
    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(output)
}

fn wait_bounded(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait().context("wait for command")?, false));
    };
    if let Some(status) = child.wait_timeout(timeout).context("wait for command")? {
        return Ok((status, false));
    }
    warn!(timeout_ms = timeout.as_millis() as u64, "command timed out, killing");
    child.kill().context("kill timed out command")?;
    Ok((child.wait().context("reap timed out command")?, true))
}

fn drain<R>(stream: Option<R>, cap: usize) -> Result<JoinHandle<Result<Captured>>>
where
    R: Read + Send + 'static,
{
    let mut stream = stream.ok_or_else(|| anyhow!("child stream was not piped"))?;
    Ok(thread::spawn(move || {
        let mut captured = Captured::default();
        let mut chunk = [0u8; 8192];
        loop {
            let n = stream.read(&mut chunk).context("read child output")?;
            if n == 0 {
                return Ok(captured);
            }
            captured.push(&chunk[..n], cap);
        }
    }))
}

fn collect(handle: JoinHandle<Result<Captured>>) -> Result<Captured> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}
