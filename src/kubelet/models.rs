//! Response of the kubelet `/configz` endpoint, reduced to the cgroup driver.
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct KubeletConfigz {
    #[serde(rename = "kubeletconfig", default)]
    pub kubelet_config: KubeletConfiguration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfiguration {
    /// Empty when kubelet runs with its default driver.
    #[serde(default)]
    pub cgroup_driver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_configz() {
        let configz: KubeletConfigz = serde_json::from_str(
            r#"{"kubeletconfig": {"cgroupDriver": "systemd", "cgroupRoot": "/"}}"#,
        )
        .unwrap();
        assert_eq!(configz.kubelet_config.cgroup_driver, "systemd");

        let configz: KubeletConfigz = serde_json::from_str(r#"{"kubeletconfig": {}}"#).unwrap();
        assert_eq!(configz.kubelet_config.cgroup_driver, "");
    }
}
