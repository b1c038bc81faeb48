//! `dd` invocations used by the stress loops.

use std::path::Path;

pub const DD: &str = "dd";
pub const ZERO_SOURCE: &str = "/dev/zero";
pub const NULL_SINK: &str = "/dev/null";
/// Output flags for the write loop: every block is flushed to the device.
pub const WRITE_OFLAG: &str = "oflag=dsync";
/// Input flags for the read loop: bypass the page cache, require whole blocks.
pub const READ_IFLAG: &str = "iflag=dsync,direct,fullblock";

/// Arguments for one synchronous write of `block_size_mb * block_count` MB
/// of zeros into `scratch`.
pub fn write_args(scratch: &Path, block_size_mb: u64, block_count: u64) -> Vec<String> {
    vec![
        format!("if={ZERO_SOURCE}"),
        format!("of={}", scratch.display()),
        format!("bs={block_size_mb}M"),
        format!("count={block_count}"),
        WRITE_OFLAG.to_string(),
    ]
}

/// Arguments for one direct read of `block_size_mb * block_count` MB from the
/// device, discarding the data.
pub fn read_args(file_system: &str, block_size_mb: u64, block_count: u64) -> Vec<String> {
    vec![
        format!("if={file_system}"),
        format!("of={NULL_SINK}"),
        format!("bs={block_size_mb}M"),
        format!("count={block_count}"),
        READ_IFLAG.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_args_target_scratch_with_dsync() {
        let args = write_args(Path::new("/tmp/chaos_burnio.log.dat"), 1, 10);
        assert_eq!(
            args,
            vec![
                "if=/dev/zero",
                "of=/tmp/chaos_burnio.log.dat",
                "bs=1M",
                "count=10",
                "oflag=dsync",
            ]
        );
    }

    #[test]
    fn read_args_target_device_with_direct_io() {
        let args = read_args("/dev/vda1", 4, 2);
        assert_eq!(
            args,
            vec![
                "if=/dev/vda1",
                "of=/dev/null",
                "bs=4M",
                "count=2",
                "iflag=dsync,direct,fullblock",
            ]
        );
    }
}
