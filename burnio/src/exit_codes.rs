//! Stable exit codes for burnio CLI commands.

/// Command succeeded. `stop` always exits with this code.
pub const OK: i32 = 0;
/// `start` failed (invalid workload, unresolvable mount point, worker did not
/// come up) or the detached worker hit a fatal I/O error.
pub const FAILURE: i32 = 1;
