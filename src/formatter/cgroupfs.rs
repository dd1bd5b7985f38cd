//! Directory names used by kubelet when the cgroup driver is `cgroupfs`.
//!
//! ```text
//! kubepods/burstable/pod<uid>/<container-hash>
//! ```
use crate::pod::{ContainerRuntime, QosClass};

use super::{Error, Result, split_container_id, trim_dir_separator};

pub(super) const PARENT_DIR: &str = "kubepods/";
pub(super) const BURSTABLE_DIR: &str = "burstable/";
pub(super) const BESTEFFORT_DIR: &str = "besteffort/";

const POD_PREFIX: &str = "pod";

pub(super) fn qos_dir(qos: QosClass) -> &'static str {
    match qos {
        QosClass::Burstable => BURSTABLE_DIR,
        QosClass::BestEffort => BESTEFFORT_DIR,
        QosClass::Guaranteed => "/",
    }
}

pub(super) fn pod_dir(_qos: QosClass, pod_uid: &str) -> String {
    format!("{POD_PREFIX}{pod_uid}/")
}

pub(super) fn container_dir(id: &str) -> Result<(ContainerRuntime, String)> {
    let (runtime, hash) = split_container_id(id)?;
    match runtime {
        ContainerRuntime::Docker | ContainerRuntime::Containerd => Ok((runtime, hash.to_owned())),
        ContainerRuntime::Unknown => Err(Error::UnknownRuntime(id.to_owned())),
    }
}

pub(super) fn parse_pod_id(basename: &str) -> Result<String> {
    trim_dir_separator(basename)
        .strip_prefix(POD_PREFIX)
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidPodDir(basename.to_owned()))
}

/// The container directory is the bare hash, so the basename is returned as is.
pub(super) fn parse_container_id(basename: &str) -> Result<String> {
    Ok(basename.to_owned())
}
