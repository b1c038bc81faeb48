//! Typed failures of the `start` path.

use thiserror::Error;

/// A mount point could not be mapped to its device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The mount table query itself failed.
    #[error("cannot find mount point {mount_point}: {reason}")]
    Query { mount_point: String, reason: String },
    #[error("cannot find mount point {mount_point}")]
    NotFound { mount_point: String },
    /// The mount point is listed but no device string came back.
    #[error("cannot find mount point {mount_point}: empty file system")]
    Empty { mount_point: String },
}

/// `start` did not leave a healthy worker behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("invalid workload: {0}")]
    InvalidSpec(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The detached invocation could not be issued.
    #[error("{0}")]
    Detach(String),
    /// The worker reported an error (or died) during the grace interval.
    #[error("{0}")]
    Startup(String),
}
