//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format, keeping only the fields
//! needed to find cgroup mounts. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure.

/// The fields of a mountinfo line relevant to cgroup discovery.
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    /// Mount point relative to the process's root.
    pub mount_point: &'a str,
    /// Filesystem type (e.g., `cgroup`, `cgroup2`).
    pub fs_type: &'a str,
    /// Superblock options. For cgroup v1 these list the attached controllers.
    pub super_options: &'a str,
}

impl MountInfo<'_> {
    /// Returns true if `option` is one of the comma-separated super options.
    pub fn has_super_option(&self, option: &str) -> bool {
        self.super_options.split(',').any(|o| o == option)
    }
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),
    #[error("missing `{field}` in line: `{line}`")]
    MissingField { field: &'static str, line: String },
}

/// Parses a single line of mountinfo data.
///
/// The mount point is the fifth field before the ` - ` separator; filesystem
/// type and super options are the first and third field after it.
///
/// # Errors
///
/// Returns [`ParseError`] variants for a missing separator or missing fields.
pub fn parse_mount_info_line(line: &str) -> Result<MountInfo<'_>, ParseError> {
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.to_owned()))?;
    let missing = |field| ParseError::MissingField {
        field,
        line: line.to_owned(),
    };

    let mount_point = pre.split_whitespace().nth(4).ok_or_else(|| missing("mount_point"))?;

    let mut post_fields = post.split_whitespace();
    let fs_type = post_fields.next().ok_or_else(|| missing("fs_type"))?;
    let _source = post_fields.next().ok_or_else(|| missing("source"))?;
    let super_options = post_fields.next().ok_or_else(|| missing("super_options"))?;

    Ok(MountInfo {
        mount_point,
        fs_type,
        super_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cgroup2_line() {
        let line = "35 24 0:30 / /sys/fs/cgroup rw,nosuid,nodev,noexec,relatime shared:9 - cgroup2 cgroup2 rw,nsdelegate";
        let info = parse_mount_info_line(line).unwrap();
        assert_eq!(info.mount_point, "/sys/fs/cgroup");
        assert_eq!(info.fs_type, "cgroup2");
        assert_eq!(info.super_options, "rw,nsdelegate");
    }

    #[test]
    fn parses_cgroup_v1_controllers() {
        let line = "30 25 0:26 / /sys/fs/cgroup/cpu,cpuacct rw,nosuid,nodev,noexec,relatime shared:11 - cgroup cgroup rw,cpu,cpuacct";
        let info = parse_mount_info_line(line).unwrap();
        assert_eq!(info.mount_point, "/sys/fs/cgroup/cpu,cpuacct");
        assert!(info.has_super_option("cpu"));
        assert!(info.has_super_option("cpuacct"));
        assert!(!info.has_super_option("cpuset"));
    }

    #[test]
    fn error_on_missing_separator() {
        let line = "42 35 0:22 / /mnt rw,nosuid ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }

    #[test]
    fn error_on_missing_mount_point() {
        let line = "42 35 0:22 / - ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "mount_point", .. }));
    }

    #[test]
    fn error_on_missing_super_options() {
        let line = "42 35 0:22 / /mnt - ext4 /dev/sda1";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "super_options", .. }));
    }

    #[test]
    fn error_on_empty_line() {
        let err = parse_mount_info_line("").unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }
}
