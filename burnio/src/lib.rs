//! Disk I/O pressure controller for chaos experiments.
//!
//! `burnio start` launches a detached worker that keeps a mount point's device
//! busy with synchronous `dd` writes and direct reads until `burnio stop` kills
//! it. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (command lines, mount-table
//!   parsing, error-line scanning, process signatures). No I/O.
//! - **[`io`]**: Side-effecting operations (process execution, detached spawn,
//!   process table, log artifact, config). Behind traits so tests can script
//!   the host.
//!
//! Orchestration modules ([`resolve`], [`launch`], [`terminate`], [`worker`])
//! combine the two to implement the CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod launch;
pub mod logging;
pub mod resolve;
pub mod terminate;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod worker;
