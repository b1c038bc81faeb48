//! Deterministic, pure logic shared by the controller.
//!
//! Core modules must be free of I/O side effects. They build command lines,
//! parse command output and describe worker state.

pub mod dd;
pub mod error_log;
pub mod mount_table;
pub mod signature;
pub mod types;
