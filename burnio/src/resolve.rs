//! Filesystem resolver: mount point to device.

use tracing::{debug, info, instrument, warn};

use crate::core::mount_table::device_for;
use crate::error::ResolveError;
use crate::io::channel::CommandChannel;

pub const MOUNT: &str = "mount";

/// Map `mount_point` to the device it is mounted from, using the mount table.
#[instrument(skip(channel))]
pub fn resolve<C: CommandChannel>(channel: &C, mount_point: &str) -> Result<String, ResolveError> {
    let response = channel.run(MOUNT, &[]);
    if !response.success {
        warn!(err = %response.error, "mount table query failed");
        return Err(ResolveError::Query {
            mount_point: mount_point.to_string(),
            reason: response.error,
        });
    }

    let device = device_for(&response.output, mount_point).ok_or_else(|| {
        debug!("mount point not in mount table");
        ResolveError::NotFound {
            mount_point: mount_point.to_string(),
        }
    })?;
    if device.trim().is_empty() {
        return Err(ResolveError::Empty {
            mount_point: mount_point.to_string(),
        });
    }

    info!(file_system = %device, "resolved mount point");
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::channel::CommandResult;
    use crate::test_support::ScriptedChannel;

    const MOUNTS: &str = "/dev/vda1 on / type ext4 (rw,relatime)\n";

    #[test]
    fn resolves_root_to_device() {
        let channel = ScriptedChannel::new(vec![CommandResult::ok(MOUNTS)]);
        assert_eq!(resolve(&channel, "/"), Ok("/dev/vda1".to_string()));
        assert_eq!(channel.calls(), vec![("mount".to_string(), Vec::new())]);
    }

    #[test]
    fn unknown_mount_point_is_not_found() {
        let channel = ScriptedChannel::new(vec![CommandResult::ok(MOUNTS)]);
        let err = resolve(&channel, "/nope").unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                mount_point: "/nope".to_string()
            }
        );
        assert_eq!(err.to_string(), "cannot find mount point /nope");
    }

    #[test]
    fn failed_query_is_a_resolution_error() {
        let channel = ScriptedChannel::new(vec![CommandResult::failed("mount: not found")]);
        let err = resolve(&channel, "/").unwrap_err();
        assert!(matches!(err, ResolveError::Query { .. }));
        assert!(err.to_string().contains("mount: not found"));
    }

    #[test]
    fn matching_line_without_device_is_empty() {
        let channel = ScriptedChannel::new(vec![CommandResult::ok(" on /odd type none (rw)\n")]);
        let err = resolve(&channel, "/odd").unwrap_err();
        assert!(matches!(err, ResolveError::Empty { .. }));
    }
}
