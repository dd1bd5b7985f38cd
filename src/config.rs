//! Environment-based configuration.
use std::path::PathBuf;
use std::time::Duration;

use crate::driver::{CgroupDriver, ParseDriverError, PollPolicy};

const DEFAULT_KUBELET_HOST: &str = "127.0.0.1";
const DEFAULT_KUBELET_SCHEME: &str = "https";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{name}`: expected a number of seconds")]
    InvalidSeconds { name: &'static str, value: String },
    #[error("invalid value for `CGROUP_DRIVER`: {0}")]
    InvalidDriver(#[from] ParseDriverError),
    #[error("invalid value `{0}` for `KUBELET_SCHEME`: expected `http` or `https`")]
    InvalidScheme(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct Config {
    /// Node whose kubelet is asked for its cgroup driver.
    pub node_name: Option<String>,
    /// Host root filesystem as seen by this process.
    pub rootfs: PathBuf,
    /// Explicit cgroup root; detected from the host's mountinfo if unset.
    pub cgroup_root: Option<PathBuf>,
    /// Explicit cgroup driver; disables detection.
    pub cgroup_driver: Option<CgroupDriver>,
    pub kubelet_host: String,
    pub kubelet_scheme: String,
    pub poll_policy: PollPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_name: None,
            rootfs: PathBuf::from("/"),
            cgroup_root: None,
            cgroup_driver: None,
            kubelet_host: DEFAULT_KUBELET_HOST.to_owned(),
            kubelet_scheme: DEFAULT_KUBELET_SCHEME.to_owned(),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` if it is unset. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let kubelet_scheme = match var("KUBELET_SCHEME") {
            Some(scheme) if scheme != "http" && scheme != "https" => {
                return Err(Error::InvalidScheme(scheme));
            }
            Some(scheme) => scheme,
            None => defaults.kubelet_scheme,
        };

        let mut poll_policy = defaults.poll_policy;
        if let Some(interval) = var("DETECT_POLL_INTERVAL_SECS") {
            poll_policy.interval = parse_seconds("DETECT_POLL_INTERVAL_SECS", interval)?;
        }
        if let Some(timeout) = var("DETECT_TIMEOUT_SECS") {
            poll_policy.timeout = parse_seconds("DETECT_TIMEOUT_SECS", timeout)?;
        }

        Ok(Config {
            node_name: var("NODE_NAME"),
            rootfs: var("ROOTFS_MOUNT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.rootfs),
            cgroup_root: var("CGROUP_ROOT").map(PathBuf::from),
            cgroup_driver: var("CGROUP_DRIVER")
                .map(|v| v.parse::<CgroupDriver>())
                .transpose()?,
            kubelet_host: var("KUBELET_HOST").unwrap_or(defaults.kubelet_host),
            kubelet_scheme,
            poll_policy,
        })
    }
}

fn parse_seconds(name: &'static str, value: String) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(Error::InvalidSeconds { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.node_name, None);
        assert_eq!(config.rootfs, PathBuf::from("/"));
        assert_eq!(config.cgroup_root, None);
        assert_eq!(config.cgroup_driver, None);
        assert_eq!(config.kubelet_host, "127.0.0.1");
        assert_eq!(config.kubelet_scheme, "https");
        assert_eq!(config.poll_policy, PollPolicy::default());
    }

    #[test]
    fn test_all_variables() {
        let config = config_from(&[
            ("NODE_NAME", "worker-1"),
            ("ROOTFS_MOUNT_PATH", "/rootfs"),
            ("CGROUP_ROOT", "/host/sys/fs/cgroup"),
            ("CGROUP_DRIVER", "cgroupfs"),
            ("KUBELET_HOST", "10.0.0.5"),
            ("KUBELET_SCHEME", "http"),
            ("DETECT_POLL_INTERVAL_SECS", "2"),
            ("DETECT_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.node_name.as_deref(), Some("worker-1"));
        assert_eq!(config.rootfs, PathBuf::from("/rootfs"));
        assert_eq!(config.cgroup_root, Some(PathBuf::from("/host/sys/fs/cgroup")));
        assert_eq!(config.cgroup_driver, Some(CgroupDriver::Cgroupfs));
        assert_eq!(config.kubelet_host, "10.0.0.5");
        assert_eq!(config.kubelet_scheme, "http");
        assert_eq!(
            config.poll_policy,
            PollPolicy::new(Duration::from_secs(2), Duration::from_secs(30))
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[("NODE_NAME", ""), ("CGROUP_DRIVER", "")]).unwrap();
        assert_eq!(config.node_name, None);
        assert_eq!(config.cgroup_driver, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("CGROUP_DRIVER", "Systemd")]).unwrap_err();
        assert!(matches!(err, Error::InvalidDriver(_)));

        let err = config_from(&[("DETECT_TIMEOUT_SECS", "1m")]).unwrap_err();
        assert!(
            matches!(err, Error::InvalidSeconds { name: "DETECT_TIMEOUT_SECS", ref value } if value == "1m")
        );

        let err = config_from(&[("KUBELET_SCHEME", "ftp")]).unwrap_err();
        assert!(matches!(err, Error::InvalidScheme(_)));
    }
}
