//! Process discovery by invocation signature.

use std::path::PathBuf;

use anyhow::{Context, Result};
use procfs::process::all_processes_with_root;
use tracing::{debug, instrument, trace};

use crate::core::signature::Signature;

/// Source of live process identifiers. Recomputed on every call, never cached.
pub trait ProcessRegistry {
    fn find_by_signature(&self, signature: &Signature) -> Result<Vec<u32>>;
}

/// Registry backed by the proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcfsRegistry {
    proc_root: PathBuf,
}

impl ProcfsRegistry {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl Default for ProcfsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry for ProcfsRegistry {
    #[instrument(skip_all, fields(signature = %signature))]
    fn find_by_signature(&self, signature: &Signature) -> Result<Vec<u32>> {
        let own_pid = std::process::id();
        let processes = all_processes_with_root(&self.proc_root)
            .with_context(|| format!("list processes in {}", self.proc_root.display()))?;

        let mut pids = Vec::new();
        // Entries that vanish between listing and reading are skipped.
        for process in processes.flatten() {
            let Ok(pid) = u32::try_from(process.pid) else {
                continue;
            };
            if pid == own_pid {
                continue;
            }
            // Zombies have an empty cmdline and never match.
            let argv = process.cmdline().unwrap_or_default();
            if signature.matches(&argv) {
                trace!(pid, ?argv, "process matches");
                pids.push(pid);
            }
        }
        pids.sort_unstable();
        debug!(count = pids.len(), "signature lookup finished");
        Ok(pids)
    }
}
