//! Kubernetes-level identifiers consumed by the path formatters.
use std::fmt;
use std::str::FromStr;

/// Quality-of-service tier of a pod, as reported in `status.qosClass`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum QosClass {
    Guaranteed,
    Burstable,
    BestEffort,
}

impl QosClass {
    pub const ALL: [QosClass; 3] = [
        QosClass::Guaranteed,
        QosClass::Burstable,
        QosClass::BestEffort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QosClass::Guaranteed => "Guaranteed",
            QosClass::Burstable => "Burstable",
            QosClass::BestEffort => "BestEffort",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid qos class: {0}")]
pub struct ParseQosClassError(String);

impl FromStr for QosClass {
    type Err = ParseQosClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Guaranteed" => Ok(QosClass::Guaranteed),
            "Burstable" => Ok(QosClass::Burstable),
            "BestEffort" => Ok(QosClass::BestEffort),
            other => Err(ParseQosClassError(other.to_owned())),
        }
    }
}

impl fmt::Display for QosClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container runtime named by the prefix of a `<runtime>://<hash>` container id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerRuntime {
    Docker,
    Containerd,
    Unknown,
}

impl ContainerRuntime {
    /// Maps a runtime prefix onto a known runtime. Anything unrecognized is
    /// [`ContainerRuntime::Unknown`].
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "docker" => ContainerRuntime::Docker,
            "containerd" => ContainerRuntime::Containerd,
            _ => ContainerRuntime::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Containerd => "containerd",
            ContainerRuntime::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_class_from_str() {
        for qos in QosClass::ALL {
            assert_eq!(QosClass::from_str(qos.as_str()).unwrap(), qos);
        }
        assert!(QosClass::from_str("burstable").is_err());
        assert!(QosClass::from_str("").is_err());
    }

    #[test]
    fn test_qos_class_deserialize() {
        let qos: QosClass = serde_json::from_str(r#""BestEffort""#).unwrap();
        assert_eq!(qos, QosClass::BestEffort);
    }

    #[test]
    fn test_container_runtime_from_prefix() {
        assert_eq!(ContainerRuntime::from_prefix("docker"), ContainerRuntime::Docker);
        assert_eq!(
            ContainerRuntime::from_prefix("containerd"),
            ContainerRuntime::Containerd
        );
        assert_eq!(ContainerRuntime::from_prefix("cri-o"), ContainerRuntime::Unknown);
        assert_eq!(ContainerRuntime::from_prefix("Docker"), ContainerRuntime::Unknown);
        assert_eq!(ContainerRuntime::Containerd.to_string(), "containerd");
    }
}
