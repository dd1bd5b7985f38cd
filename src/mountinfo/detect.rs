use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Version of the cgroup hierarchy kubelet places pods into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    V1,
    V2,
}

/// A cgroup hierarchy mounted on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupMount {
    pub version: CgroupVersion,
    pub mount_point: PathBuf,
}

/// Detects the cgroup mount holding the `kubepods` roots and validates that it
/// is an existing directory.
///
/// The returned mount point is canonicalized.
///
/// # Errors
///
/// Returns errors from [`detect_cgroup_mount`] and:
///
/// - [`Error::Canonicalization`] if the path cannot be canonicalized.
/// - [`Error::Metadata`] if the path cannot be accessed.
/// - [`Error::NotADirectory`] if the resolved path is not a directory.
pub fn detect_validated_cgroup_mount(path: impl AsRef<Path>) -> Result<CgroupMount> {
    let mount = detect_cgroup_mount(&path)?;
    let canonical =
        std::fs::canonicalize(&mount.mount_point).map_err(|source| Error::Canonicalization {
            path: mount.mount_point.clone(),
            source,
        })?;

    let metadata = std::fs::metadata(&canonical).map_err(|source| Error::Metadata {
        path: canonical.clone(),
        source,
    })?;

    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path: canonical });
    }

    Ok(CgroupMount {
        mount_point: canonical,
        ..mount
    })
}

/// Detects the cgroup mount holding the `kubepods` roots by parsing a Linux
/// `mountinfo` file.
///
/// A cgroup v1 hierarchy with the `cpu` controller attached takes precedence,
/// since on legacy and hybrid hosts kubelet manages pods in the v1 hierarchies
/// even when a unified `cgroup2` mount exists alongside. Otherwise the first
/// `cgroup2` mount is used.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if parsing any line fails.
/// - [`Error::MissingCgroupMount`] if neither kind of mount is found.
///
/// # Example
///
/// ```no_run
/// use cgroup_pathfinder::mountinfo::detect_cgroup_mount;
///
/// let mount = detect_cgroup_mount("/proc/self/mountinfo").unwrap();
/// println!("cgroup root: {}", mount.mount_point.display());
/// ```
pub fn detect_cgroup_mount(path: impl AsRef<Path>) -> Result<CgroupMount> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    detect_cgroup_mount_from_reader(buf, path)
}

fn detect_cgroup_mount_from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<CgroupMount> {
    let mut line = String::with_capacity(256);
    let mut unified = None;

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        let mount_info = parse_mount_info_line(line.as_str()).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        match mount_info.fs_type {
            "cgroup" if mount_info.has_super_option("cpu") => {
                log::debug!("Found cgroup v1 cpu mount point: {}", mount_info.mount_point);
                return Ok(CgroupMount {
                    version: CgroupVersion::V1,
                    mount_point: PathBuf::from(mount_info.mount_point),
                });
            }
            "cgroup2" if unified.is_none() => {
                log::debug!("Found `cgroup2` mount point: {}", mount_info.mount_point);
                unified = Some(PathBuf::from(mount_info.mount_point));
            }
            _ => {}
        }

        line.clear();
    }

    match unified {
        Some(mount_point) => Ok(CgroupMount {
            version: CgroupVersion::V2,
            mount_point,
        }),
        None => Err(Error::MissingCgroupMount {
            path: origin.to_path_buf(),
        }),
    }
}
