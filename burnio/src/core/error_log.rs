//! Error-marker lines in the log artifact.
//!
//! The worker reports fatal failures as `Error: <message>` lines. The launcher
//! scans for them after the grace interval.

/// Prefix of every error line written to the log artifact.
pub const ERR_PREFIX: &str = "Error:";

/// Render one error line (with trailing newline).
pub fn format_error_line(message: &str) -> String {
    format!("{ERR_PREFIX} {}\n", message.trim())
}

/// Collect the messages of all error lines in `log`.
///
/// Lines whose message is empty after trimming are ignored. Returns `None`
/// when no usable error line exists.
pub fn find_errors(log: &str) -> Option<String> {
    let messages: Vec<&str> = log
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(ERR_PREFIX))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}
