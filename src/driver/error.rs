use std::time::Duration;

/// Errors that may occur during authoritative cgroup driver detection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timed out after {timeout:?} detecting the cgroup driver of node `{node_name}` from kubelet")]
    Timeout { node_name: String, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;
