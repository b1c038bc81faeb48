//! Parsing of `mount` output.
//!
//! Lines look like `/dev/vda1 on / type ext4 (rw,relatime)`. The device is the
//! first field of the line whose `on <mount point> ` segment matches.

/// Strip trailing slashes so `/data/` and `/data` match the same entry.
fn normalize(mount_point: &str) -> &str {
    let trimmed = mount_point.trim_end_matches('/');
    if trimmed.is_empty() && mount_point.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Find the device entry for `mount_point` in `mount` output.
///
/// Returns `None` when no line mentions the mount point. Returns `Some("")`
/// when a line matches but carries no device field.
pub fn device_for(mount_output: &str, mount_point: &str) -> Option<String> {
    let mount_point = normalize(mount_point.trim());
    if mount_point.is_empty() {
        return None;
    }
    let needle = format!("on {mount_point} ");
    for line in mount_output.lines() {
        let Some(idx) = line.find(&needle) else {
            continue;
        };
        // `on` must start a field, otherwise `/mnt/won /` would match `on /`.
        if idx > 0 && !line[..idx].ends_with(char::is_whitespace) {
            continue;
        }
        let device = line[..idx].split_whitespace().next().unwrap_or("");
        return Some(device.to_string());
    }
    None
}
