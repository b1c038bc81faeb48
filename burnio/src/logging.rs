//! Diagnostic tracing for the controller.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: diagnostics via `RUST_LOG`, output to stderr.
//!   In the detached worker stderr is the log artifact, so worker diagnostics
//!   end up next to its error lines.
//!
//! - **Error lines (`core/error_log`)**: `Error: ...` product output that the
//!   launcher scans for. Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format, no ANSI colors (the worker writes to a file).
///
/// # Example
/// ```bash
/// RUST_LOG=burnio=debug burnio start --mount-point / --write
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .compact(),
        )
        .init();
}
