//! Test-only fakes for the host: command channel, process table and detacher.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::signature::Signature;
use crate::core::types::WorkerState;
use crate::io::artifacts::open_append;
use crate::io::channel::{CommandChannel, CommandResult};
use crate::io::detach::{DetachRequest, Detacher, StartupProbe};
use crate::io::registry::ProcessRegistry;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Channel that replays queued results and records every call.
///
/// When the queue is empty, `fallback` is returned. `kill` calls also remove
/// the listed pids from an attached [`FakeRegistry`].
pub struct ScriptedChannel {
    responses: Mutex<VecDeque<CommandResult>>,
    fallback: CommandResult,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    registry: Option<FakeRegistry>,
}

impl ScriptedChannel {
    pub fn new(responses: Vec<CommandResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: CommandResult::ok(""),
            calls: Mutex::new(Vec::new()),
            registry: None,
        }
    }

    pub fn with_fallback(mut self, fallback: CommandResult) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_registry(mut self, registry: FakeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.calls).clone()
    }

    /// Calls made to `program`, in order.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        lock(&self.calls)
            .iter()
            .filter(|(p, _)| p == program)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

impl CommandChannel for ScriptedChannel {
    fn run(&self, program: &str, args: &[String]) -> CommandResult {
        lock(&self.calls).push((program.to_string(), args.to_vec()));
        if program == "kill"
            && let Some(registry) = &self.registry
        {
            let pids: Vec<u32> = args.iter().filter_map(|a| a.parse().ok()).collect();
            registry.remove(&pids);
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Channel answering from a closure. Useful when calls come from several threads.
pub struct FnChannel<F>(pub F);

impl<F> CommandChannel for FnChannel<F>
where
    F: Fn(&str, &[String]) -> CommandResult,
{
    fn run(&self, program: &str, args: &[String]) -> CommandResult {
        (self.0)(program, args)
    }
}

/// In-memory process table matched with the real [`Signature`] logic.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    processes: Arc<Mutex<Vec<(u32, Vec<String>)>>>,
    fail_lookups: bool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose lookups always fail.
    pub fn failing() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    pub fn spawn(&self, pid: u32, argv: &[&str]) {
        let argv = argv.iter().map(|s| s.to_string()).collect();
        lock(&self.processes).push((pid, argv));
    }

    pub fn spawn_argv(&self, pid: u32, argv: Vec<String>) {
        lock(&self.processes).push((pid, argv));
    }

    pub fn remove(&self, pids: &[u32]) {
        lock(&self.processes).retain(|(pid, _)| !pids.contains(pid));
    }

    pub fn pids(&self) -> Vec<u32> {
        lock(&self.processes).iter().map(|(pid, _)| *pid).collect()
    }
}

impl ProcessRegistry for FakeRegistry {
    fn find_by_signature(&self, signature: &Signature) -> Result<Vec<u32>> {
        if self.fail_lookups {
            return Err(anyhow!("process table unavailable"));
        }
        Ok(lock(&self.processes)
            .iter()
            .filter(|(_, argv)| signature.matches(argv))
            .map(|(pid, _)| *pid)
            .collect())
    }
}

/// What a [`ScriptedDetacher`] does when asked to detach.
#[derive(Debug, Clone)]
pub enum ScriptedDetach {
    /// The detached invocation itself fails.
    Fail(String),
    /// The worker starts; the probe reports `state` and `log` is appended to the
    /// log artifact as if the worker wrote it during the grace interval.
    Start {
        pid: u32,
        state: WorkerState,
        log: Option<String>,
    },
}

/// Detacher that records requests and simulates the worker.
pub struct ScriptedDetacher {
    outcome: ScriptedDetach,
    registry: Option<FakeRegistry>,
    requests: Mutex<Vec<DetachRequest>>,
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedDetacher {
    pub fn new(outcome: ScriptedDetach) -> Self {
        Self {
            outcome,
            registry: None,
            requests: Mutex::new(Vec::new()),
            waits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn running(pid: u32) -> Self {
        Self::new(ScriptedDetach::Start {
            pid,
            state: WorkerState::Running,
            log: None,
        })
    }

    /// Started workers show up in `registry` under their full argv.
    pub fn with_registry(mut self, registry: FakeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn requests(&self) -> Vec<DetachRequest> {
        lock(&self.requests).clone()
    }

    /// Grace intervals the probes of this detacher were asked to wait, in order.
    pub fn waits(&self) -> Vec<Duration> {
        lock(&self.waits).clone()
    }
}

/// Probe returning a fixed state; records the grace interval it was given.
pub struct ScriptedProbe {
    state: WorkerState,
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl StartupProbe for ScriptedProbe {
    fn wait(&mut self, grace: Duration) -> Result<WorkerState> {
        lock(&self.waits).push(grace);
        Ok(self.state.clone())
    }
}

impl Detacher for ScriptedDetacher {
    type Probe = ScriptedProbe;

    fn detach(&self, request: &DetachRequest) -> Result<ScriptedProbe> {
        lock(&self.requests).push(request.clone());
        match &self.outcome {
            ScriptedDetach::Fail(err) => Err(anyhow!("{err}")),
            ScriptedDetach::Start { pid, state, log } => {
                if let Some(registry) = &self.registry {
                    let mut argv = vec![request.program.display().to_string()];
                    argv.extend(request.args.iter().cloned());
                    registry.spawn_argv(*pid, argv);
                }
                if let Some(line) = log {
                    let mut file = open_append(&request.log_path)?;
                    file.write_all(line.as_bytes())?;
                }
                Ok(ScriptedProbe {
                    state: state.clone(),
                    waits: Arc::clone(&self.waits),
                })
            }
        }
    }
}
