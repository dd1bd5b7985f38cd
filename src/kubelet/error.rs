use std::path::PathBuf;

use crate::driver::ParseDriverError;

/// Errors that may occur while asking the cluster for the kubelet's cgroup driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to infer cluster config from kubeconfig or in-cluster environment: {0}")]
    InferConfig(#[source] kube::config::InferConfigError),
    #[error("failed to create Kubernetes client: {0}")]
    Client(#[source] kube::Error),
    #[error("failed to get node `{node_name}`: {source}")]
    GetNode {
        node_name: String,
        #[source]
        source: kube::Error,
    },
    #[error("node `{node_name}` does not report a kubelet endpoint port")]
    MissingKubeletPort { node_name: String },
    #[error("failed to read bearer token `{path}`: {source}")]
    ReadToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to query kubelet config on port {port}: {source}")]
    KubeletRequest {
        port: u16,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode kubelet config from port {port}: {source}")]
    KubeletDecode {
        port: u16,
        #[source]
        source: reqwest::Error,
    },
    #[error("kubelet reported an unsupported cgroup driver: {0}")]
    InvalidDriver(#[from] ParseDriverError),
}

pub type Result<T> = std::result::Result<T, Error>;
