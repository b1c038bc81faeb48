//! CLI tests for `burnio start`, `stop` and `run-detached`.
//!
//! Spawns the burnio binary against a temporary artifact directory and checks
//! exit codes, printed results and what is left in the process table.

use std::path::Path;
use std::process::{Command, Output};

use burnio::core::signature::task_signatures;
use burnio::exit_codes;
use burnio::io::artifacts::ArtifactPaths;
use burnio::io::registry::{ProcessRegistry, ProcfsRegistry};

fn burnio(artifact_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_burnio"))
        .arg(format!("--artifact-dir={}", artifact_dir.display()))
        .args(args)
        .output()
        .expect("spawn burnio")
}

/// Pids of burnio processes (worker or `dd` tasks) bound to `paths`.
fn live_stress_pids(paths: &ArtifactPaths) -> Vec<u32> {
    let registry = ProcfsRegistry::new();
    let mut pids = Vec::new();
    for signature in task_signatures(&paths.dir, &paths.scratch_path) {
        // The read signature is shared by every burnio instance on the host.
        if signature.name == "read" {
            continue;
        }
        pids.extend(registry.find_by_signature(&signature).expect("scan /proc"));
    }
    pids
}

#[test]
fn stop_is_idempotent_and_removes_artifacts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(temp.path());
    paths.append_error("left over from an earlier run").expect("seed log");
    std::fs::write(&paths.scratch_path, b"zeros").expect("seed scratch");

    let first = burnio(temp.path(), &["stop"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    assert!(!paths.log_path.exists());
    assert!(!paths.scratch_path.exists());

    let second = burnio(temp.path(), &["stop"]);
    assert_eq!(second.status.code(), Some(exit_codes::OK));
}

#[test]
fn start_without_read_or_write_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = burnio(temp.path(), &["start", "--mount-point", "/"]);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid workload"), "stderr: {stderr}");
}

#[cfg(target_os = "linux")]
#[test]
fn start_on_unknown_mount_point_fails_without_worker() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(temp.path());

    let output = burnio(
        temp.path(),
        &["start", "--mount-point", "/burnio/not/mounted", "--write"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cannot find mount point /burnio/not/mounted"),
        "stderr: {stderr}"
    );
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
    assert!(live_stress_pids(&paths).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn read_loop_failure_is_written_to_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(temp.path());

    let output = burnio(
        temp.path(),
        &[
            "run-detached",
            "--file-system=/dev/null/burnio",
            "--size=1",
            "--count=1",
            "--read",
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let log = std::fs::read_to_string(&paths.log_path).expect("read log");
    assert!(
        log.contains("Error: The file system named /dev/null/burnio is not supported or"),
        "log: {log}"
    );
}

#[test]
fn rejected_worker_invocation_is_written_to_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(temp.path());

    let output = burnio(temp.path(), &["run-detached", "--size=1", "--count=1"]);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let log = std::fs::read_to_string(&paths.log_path).expect("read log");
    assert!(log.contains("Error: invalid workload:"), "log: {log}");
}

#[cfg(target_os = "linux")]
#[test]
fn start_then_stop_leaves_no_stress_processes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(temp.path());

    let output = burnio(
        temp.path(),
        &[
            "start",
            "--mount-point",
            "/",
            "--file-system",
            "/dev/null",
            "--size",
            "1",
            "--count",
            "1",
            "--write",
        ],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "stderr: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "success");
    assert!(!live_stress_pids(&paths).is_empty(), "worker should be running");

    let stop = burnio(temp.path(), &["stop"]);
    assert_eq!(stop.status.code(), Some(exit_codes::OK));
    assert!(live_stress_pids(&paths).is_empty());
    assert!(!paths.log_path.exists());
}
