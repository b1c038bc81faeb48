//! Invocation signatures that identify stress processes.

use std::fmt;
use std::path::Path;

use crate::core::dd::{NULL_SINK, READ_IFLAG, ZERO_SOURCE};

/// Subcommand the launcher uses for the detached worker.
pub const WORKER_SUBCOMMAND: &str = "run-detached";

/// A process matches when every marker is one of its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub markers: Vec<String>,
}

impl Signature {
    pub fn new(name: &'static str, markers: Vec<String>) -> Self {
        Self { name, markers }
    }

    pub fn matches(&self, argv: &[String]) -> bool {
        !self.markers.is_empty()
            && self
                .markers
                .iter()
                .all(|marker| argv.iter().any(|arg| arg == marker))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.markers.join(" "))
    }
}

/// `--artifact-dir=<dir>` argument; identifies workers of one artifact namespace.
pub fn artifact_dir_arg(dir: &Path) -> String {
    format!("--artifact-dir={}", dir.display())
}

/// Signatures in kill order: the worker first, so it cannot start another
/// `dd` once its current one dies, then the write and read tasks.
pub fn task_signatures(artifact_dir: &Path, scratch: &Path) -> Vec<Signature> {
    vec![
        Signature::new(
            "worker",
            vec![WORKER_SUBCOMMAND.to_string(), artifact_dir_arg(artifact_dir)],
        ),
        Signature::new(
            "write",
            vec![
                format!("if={ZERO_SOURCE}"),
                format!("of={}", scratch.display()),
            ],
        ),
        Signature::new(
            "read",
            vec![format!("of={NULL_SINK}"), READ_IFLAG.to_string()],
        ),
    ]
}
