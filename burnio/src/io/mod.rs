//! I/O helpers for controller commands.

pub mod artifacts;
pub mod channel;
pub mod config;
pub mod detach;
pub mod process;
pub mod registry;
