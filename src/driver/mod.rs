//! Cgroup driver detection.
//!
//! Kubelet and the container runtime agree on one of two cgroup drivers,
//! `cgroupfs` or `systemd`. The choice is node configuration and cannot be read
//! directly, so it is inferred:
//!
//! 1. [`guess_from_cgroup_root`] looks at the names of the `kubepods` roots that
//!    already exist below the cgroup root. Cheap, but inconclusive before the
//!    first pod has been started or on unusual layouts.
//! 2. [`detect_from_kubelet`] asks the kubelet for its configured driver. This is
//!    authoritative but polls for up to a minute.
//!
//! [`detect`] combines both and always yields a driver.
mod detect;
mod error;

pub use detect::{
    PollPolicy, detect, detect_from_kubelet, guess_from_cgroup_root, guess_from_dir_names,
};
pub use error::{Error, Result};

use std::fmt;
use std::str::FromStr;

/// The cgroup driver used by kubelet on this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupDriver {
    Cgroupfs,
    Systemd,
}

impl CgroupDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            CgroupDriver::Cgroupfs => "cgroupfs",
            CgroupDriver::Systemd => "systemd",
        }
    }
}

/// Error returned when a string names neither `cgroupfs` nor `systemd`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cgroup driver `{0}`")]
pub struct ParseDriverError(String);

impl FromStr for CgroupDriver {
    type Err = ParseDriverError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cgroupfs" => Ok(CgroupDriver::Cgroupfs),
            "systemd" => Ok(CgroupDriver::Systemd),
            other => Err(ParseDriverError(other.to_owned())),
        }
    }
}

impl fmt::Display for CgroupDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
