//! Workload terminator: kill every stress process and remove the artifacts.
//!
//! Termination depends only on what the OS shows (process command lines), never
//! on worker state, and it never fails the caller.

use tracing::{debug, info, instrument, warn};

use crate::core::signature::task_signatures;
use crate::io::artifacts::ArtifactPaths;
use crate::io::channel::CommandChannel;
use crate::io::registry::ProcessRegistry;

pub const KILL: &str = "kill";

/// What a stop request found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminateOutcome {
    /// Processes a kill was issued for.
    pub killed: usize,
}

impl TerminateOutcome {
    /// Nothing was running. A normal, idempotent outcome.
    pub fn is_noop(&self) -> bool {
        self.killed == 0
    }
}

/// Force-kill all processes matching the stress signatures of `paths`, then
/// remove the log artifact and scratch file.
///
/// Lookup, kill and delete failures are logged and swallowed.
#[instrument(skip_all, fields(artifact_dir = %paths.dir.display()))]
pub fn terminate<C: CommandChannel, R: ProcessRegistry>(
    channel: &C,
    registry: &R,
    paths: &ArtifactPaths,
) -> TerminateOutcome {
    let mut outcome = TerminateOutcome::default();

    for signature in task_signatures(&paths.dir, &paths.scratch_path) {
        let pids = match registry.find_by_signature(&signature) {
            Ok(pids) => pids,
            Err(err) => {
                warn!(%signature, err = %format!("{err:#}"), "process lookup failed");
                continue;
            }
        };
        if pids.is_empty() {
            debug!(%signature, "no matching processes");
            continue;
        }

        let mut args = vec!["-9".to_string()];
        args.extend(pids.iter().map(u32::to_string));
        let response = channel.run(KILL, &args);
        if !response.success {
            // Some of them may have exited between lookup and kill.
            warn!(%signature, ?pids, err = %response.error, "kill reported failure");
        }
        info!(%signature, ?pids, "killed stress processes");
        outcome.killed += pids.len();
    }

    paths.remove_all();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signature::artifact_dir_arg;
    use crate::io::channel::CommandResult;
    use crate::test_support::{FakeRegistry, ScriptedChannel};

    fn setup() -> (tempfile::TempDir, ArtifactPaths) {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths::new(temp.path());
        (temp, paths)
    }

    #[test]
    fn stop_with_nothing_running_is_a_noop() {
        let (_temp, paths) = setup();
        let channel = ScriptedChannel::new(Vec::new());
        let registry = FakeRegistry::new();

        let outcome = terminate(&channel, &registry, &paths);
        assert!(outcome.is_noop());
        assert!(channel.calls_to(KILL).is_empty());

        // Second call behaves the same.
        assert!(terminate(&channel, &registry, &paths).is_noop());
    }

    #[test]
    fn kills_worker_first_then_dd_tasks_in_batches() {
        let (_temp, paths) = setup();
        let registry = FakeRegistry::new();
        let dir_arg = artifact_dir_arg(&paths.dir);
        let of_arg = format!("of={}", paths.scratch_path.display());
        registry.spawn(10, &["burnio", &dir_arg, "run-detached", "--write", "--read"]);
        registry.spawn(11, &["dd", "if=/dev/zero", &of_arg, "bs=1M", "count=10", "oflag=dsync"]);
        registry.spawn(12, &["dd", "if=/dev/vda1", "of=/dev/null", "iflag=dsync,direct,fullblock"]);
        registry.spawn(13, &["dd", "if=/dev/vda1", "of=/dev/null", "iflag=dsync,direct,fullblock"]);
        registry.spawn(99, &["sshd"]);
        let channel = ScriptedChannel::new(Vec::new()).with_registry(registry.clone());

        let outcome = terminate(&channel, &registry, &paths);

        assert_eq!(outcome.killed, 4);
        assert_eq!(
            channel.calls_to(KILL),
            vec![
                vec!["-9".to_string(), "10".to_string()],
                vec!["-9".to_string(), "11".to_string()],
                vec!["-9".to_string(), "12".to_string(), "13".to_string()],
            ]
        );
        assert_eq!(registry.pids(), vec![99]);
    }

    #[test]
    fn stop_finds_worker_started_with_trailing_slash_dir() {
        let (temp, paths) = setup();
        let started = ArtifactPaths::new(format!("{}/", temp.path().display()));
        let registry = FakeRegistry::new();
        let dir_arg = artifact_dir_arg(&started.dir);
        registry.spawn(10, &["burnio", &dir_arg, "run-detached", "--write"]);
        let channel = ScriptedChannel::new(Vec::new()).with_registry(registry.clone());

        let outcome = terminate(&channel, &registry, &paths);

        assert_eq!(outcome.killed, 1);
        assert!(registry.pids().is_empty());
    }

    #[test]
    fn removes_log_and_scratch_files() {
        let (_temp, paths) = setup();
        paths.append_error("old failure").expect("append");
        std::fs::write(&paths.scratch_path, b"zeros").expect("write scratch");

        terminate(
            &ScriptedChannel::new(Vec::new()),
            &FakeRegistry::new(),
            &paths,
        );

        assert!(!paths.log_path.exists());
        assert!(!paths.scratch_path.exists());
    }

    #[test]
    fn lookup_and_kill_failures_are_swallowed() {
        let (_temp, paths) = setup();
        paths.append_error("old failure").expect("append");

        let outcome = terminate(
            &ScriptedChannel::new(Vec::new()),
            &FakeRegistry::failing(),
            &paths,
        );
        assert!(outcome.is_noop());
        assert!(!paths.log_path.exists());

        let registry = FakeRegistry::new();
        registry.spawn(5, &["dd", "if=/dev/x", "of=/dev/null", "iflag=dsync,direct,fullblock"]);
        let channel = ScriptedChannel::new(Vec::new())
            .with_fallback(CommandResult::failed("kill: (5) - No such process"));
        let outcome = terminate(&channel, &registry, &paths);
        assert_eq!(outcome.killed, 1);
    }
}
