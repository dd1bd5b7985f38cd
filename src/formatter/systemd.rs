//! Directory names used by kubelet when the cgroup driver is `systemd`.
//!
//! Every pod lives in its own slice unit below a QoS slice, and every container
//! is a scope unit inside the pod slice:
//!
//! ```text
//! kubepods.slice/kubepods-burstable.slice/kubepods-burstable-pod<uid>.slice/cri-containerd-<id>.scope
//! ```
use crate::pod::{ContainerRuntime, QosClass};

use super::{Error, Result, split_container_id, trim_dir_separator};

pub(super) const PARENT_DIR: &str = "kubepods.slice/";
pub(super) const BURSTABLE_DIR: &str = "kubepods-burstable.slice/";
pub(super) const BESTEFFORT_DIR: &str = "kubepods-besteffort.slice/";

const SLICE_SUFFIX: &str = ".slice";
const SCOPE_SUFFIX: &str = ".scope";

// Tried in this order: besteffort, burstable, guaranteed.
const POD_PREFIXES: [&str; 3] = [
    "kubepods-besteffort-pod",
    "kubepods-burstable-pod",
    "kubepods-pod",
];
const DOCKER_PREFIX: &str = "docker-";
const CONTAINERD_PREFIX: &str = "cri-containerd-";

pub(super) fn qos_dir(qos: QosClass) -> &'static str {
    match qos {
        QosClass::Burstable => BURSTABLE_DIR,
        QosClass::BestEffort => BESTEFFORT_DIR,
        QosClass::Guaranteed => "/",
    }
}

/// Pod UIDs are embedded with every `-` replaced by `_`, since `-` separates
/// the nesting levels of a systemd slice name.
pub(super) fn pod_dir(qos: QosClass, pod_uid: &str) -> String {
    let id = pod_uid.replace('-', "_");
    match qos {
        QosClass::Burstable => format!("kubepods-burstable-pod{id}.slice/"),
        QosClass::BestEffort => format!("kubepods-besteffort-pod{id}.slice/"),
        QosClass::Guaranteed => format!("kubepods-pod{id}.slice/"),
    }
}

pub(super) fn container_dir(id: &str) -> Result<(ContainerRuntime, String)> {
    let (runtime, hash) = split_container_id(id)?;
    match runtime {
        ContainerRuntime::Docker => Ok((runtime, format!("{DOCKER_PREFIX}{hash}{SCOPE_SUFFIX}"))),
        ContainerRuntime::Containerd => Ok((
            runtime,
            format!("{CONTAINERD_PREFIX}{hash}{SCOPE_SUFFIX}"),
        )),
        ContainerRuntime::Unknown => Err(Error::UnknownRuntime(id.to_owned())),
    }
}

/// The returned UID keeps its underscores; the original hyphens are not restored.
pub(super) fn parse_pod_id(basename: &str) -> Result<String> {
    let name = trim_dir_separator(basename);
    POD_PREFIXES
        .iter()
        .find_map(|prefix| strip_affixes(name, prefix, SLICE_SUFFIX))
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidPodDir(basename.to_owned()))
}

pub(super) fn parse_container_id(basename: &str) -> Result<String> {
    let name = trim_dir_separator(basename);
    [DOCKER_PREFIX, CONTAINERD_PREFIX]
        .iter()
        .find_map(|prefix| strip_affixes(name, prefix, SCOPE_SUFFIX))
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidContainerDir(basename.to_owned()))
}

/// Returns the part of `s` between `prefix` and `suffix`, if `s` has both.
///
/// A name shorter than prefix and suffix combined never matches, even if the
/// two overlap inside it.
fn strip_affixes<'a>(s: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.strip_suffix(suffix)
}
