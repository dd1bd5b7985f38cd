//! Conversion between Kubernetes identifiers and kubelet cgroup directory names.
//!
//! Kubelet lays out the `kubepods` hierarchy differently depending on the
//! cgroup driver it is configured with. A [`PathFormatter`] captures one of
//! those conventions and converts in both directions:
//!
//! - QoS class, pod UID and container ID → directory names
//! - pod and container directory basenames → pod UID and container hash
//!
//! Formatters are plain values without state, so they can be copied freely.
//! The node-wide choice of convention is held by a [`FormatterSelector`].
//!
//! # Examples
//!
//! ```
//! use cgroup_pathfinder::driver::CgroupDriver;
//! use cgroup_pathfinder::formatter::PathFormatter;
//! use cgroup_pathfinder::pod::QosClass;
//!
//! let formatter = PathFormatter::for_driver(CgroupDriver::Systemd);
//! let pod_dir = formatter.pod_dir(QosClass::Burstable, "abc-123-def");
//! assert_eq!(pod_dir, "kubepods-burstable-podabc_123_def.slice/");
//! assert_eq!(formatter.parse_pod_id(&pod_dir).unwrap(), "abc_123_def");
//! ```
mod cgroupfs;
mod error;
mod selector;
mod systemd;

pub use error::{Error, Result};
pub use selector::FormatterSelector;

use crate::driver::CgroupDriver;
use crate::pod::{ContainerRuntime, QosClass};

/// Directory naming convention of one cgroup driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFormatter {
    Systemd,
    Cgroupfs,
}

impl PathFormatter {
    /// Returns the formatter matching `driver`.
    pub fn for_driver(driver: CgroupDriver) -> Self {
        match driver {
            CgroupDriver::Systemd => PathFormatter::Systemd,
            CgroupDriver::Cgroupfs => PathFormatter::Cgroupfs,
        }
    }

    /// Returns the formatter for a raw driver name.
    ///
    /// Unsupported names are logged and resolve to the systemd formatter, so
    /// this never fails.
    pub fn for_driver_name(name: &str) -> Self {
        match name.parse::<CgroupDriver>() {
            Ok(driver) => Self::for_driver(driver),
            Err(err) => {
                log::warn!("cgroup driver formatter not supported: {}", err);
                PathFormatter::Systemd
            }
        }
    }

    pub fn driver(&self) -> CgroupDriver {
        match self {
            PathFormatter::Systemd => CgroupDriver::Systemd,
            PathFormatter::Cgroupfs => CgroupDriver::Cgroupfs,
        }
    }

    /// Name of the directory below the cgroup root that holds all pods.
    pub fn parent_dir(&self) -> &'static str {
        match self {
            PathFormatter::Systemd => systemd::PARENT_DIR,
            PathFormatter::Cgroupfs => cgroupfs::PARENT_DIR,
        }
    }

    /// Name of the directory below [`parent_dir`](Self::parent_dir) for a QoS
    /// tier. Guaranteed pods are not nested, which is expressed as `"/"`.
    pub fn qos_dir(&self, qos: QosClass) -> &'static str {
        match self {
            PathFormatter::Systemd => systemd::qos_dir(qos),
            PathFormatter::Cgroupfs => cgroupfs::qos_dir(qos),
        }
    }

    /// Name of the directory of a single pod below its QoS directory.
    pub fn pod_dir(&self, qos: QosClass, pod_uid: &str) -> String {
        match self {
            PathFormatter::Systemd => systemd::pod_dir(qos, pod_uid),
            PathFormatter::Cgroupfs => cgroupfs::pod_dir(qos, pod_uid),
        }
    }

    /// Name of the leaf directory of a container, given its runtime-prefixed
    /// id (e.g. `containerd://<hash>`).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidContainerId`] if `id` has no `://` separator.
    /// - [`Error::UnknownRuntime`] if the runtime is neither `docker` nor `containerd`.
    pub fn container_dir(&self, id: &str) -> Result<(ContainerRuntime, String)> {
        match self {
            PathFormatter::Systemd => systemd::container_dir(id),
            PathFormatter::Cgroupfs => cgroupfs::container_dir(id),
        }
    }

    /// Recovers the pod UID from a pod directory basename.
    ///
    /// Under the systemd convention the UID is returned in its underscore form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPodDir`] if the basename is not a pod directory.
    pub fn parse_pod_id(&self, basename: &str) -> Result<String> {
        match self {
            PathFormatter::Systemd => systemd::parse_pod_id(basename),
            PathFormatter::Cgroupfs => cgroupfs::parse_pod_id(basename),
        }
    }

    /// Recovers the container hash from a container directory basename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerDir`] if the basename is not a
    /// container directory.
    pub fn parse_container_id(&self, basename: &str) -> Result<String> {
        match self {
            PathFormatter::Systemd => systemd::parse_container_id(basename),
            PathFormatter::Cgroupfs => cgroupfs::parse_container_id(basename),
        }
    }
}

/// Splits `<runtime>://<hash>` into its runtime and hash.
///
/// Only the first two `://`-separated parts are considered; anything after a
/// second separator is dropped.
fn split_container_id(id: &str) -> Result<(ContainerRuntime, &str)> {
    let mut parts = id.split("://");
    let prefix = parts.next().unwrap_or_default();
    let hash = parts
        .next()
        .ok_or_else(|| Error::InvalidContainerId(id.to_owned()))?;

    Ok((ContainerRuntime::from_prefix(prefix), hash))
}

/// Formatted directory names end in `/`; basenames read from disk do not.
fn trim_dir_separator(basename: &str) -> &str {
    basename.strip_suffix('/').unwrap_or(basename)
}
