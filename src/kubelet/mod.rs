//! Minimal Kubernetes access needed to read the kubelet's cgroup driver.
//!
//! Two requests are involved: the Node object is fetched from the API server
//! to learn the kubelet's port, and the kubelet's `/configz` endpoint is then
//! asked for its configuration. Both are expressed by [`KubeletProbe`] so the
//! detector can be driven by fakes.
mod error;
pub mod models;

pub use error::{Error, Result};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::{Api, Client};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The cgroup driver kubelet uses when its configuration leaves it empty.
const KUBELET_DEFAULT_CGROUP_DRIVER: &str = "cgroupfs";

/// Source of the kubelet's configured cgroup driver.
pub trait KubeletProbe {
    /// Returns the port the kubelet of `node_name` serves on.
    fn kubelet_port(&self, node_name: &str) -> impl Future<Output = Result<u16>> + Send;

    /// Returns the raw cgroup driver name configured in the kubelet listening
    /// on `port`. The value is not validated.
    fn cgroup_driver(&self, port: u16) -> impl Future<Output = Result<String>> + Send;
}

/// [`KubeletProbe`] talking to the real API server and kubelet.
///
/// Unless a config is given, the cluster config is inferred again for every
/// request, from `KUBECONFIG`/`~/.kube/config` or the in-cluster service
/// account, so credentials that appear or rotate are picked up by the next
/// attempt.
#[derive(Clone)]
pub struct KubeletClient {
    api_config: Option<kube::Config>,
    kubelet_host: String,
    kubelet_scheme: String,
}

impl fmt::Debug for KubeletClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeletClient")
            .field(
                "api_server",
                &self.api_config.as_ref().map(|c| c.cluster_url.to_string()),
            )
            .field("kubelet_host", &self.kubelet_host)
            .field("kubelet_scheme", &self.kubelet_scheme)
            .finish()
    }
}

impl KubeletClient {
    /// Creates a client reaching the kubelet at `<scheme>://<host>:<port>`.
    pub fn new(kubelet_host: impl Into<String>, kubelet_scheme: impl Into<String>) -> Self {
        Self {
            api_config: None,
            kubelet_host: kubelet_host.into(),
            kubelet_scheme: kubelet_scheme.into(),
        }
    }

    /// Uses `config` instead of inferring the cluster config.
    pub fn with_config(mut self, config: kube::Config) -> Self {
        self.api_config = Some(config);
        self
    }

    async fn config(&self) -> Result<kube::Config> {
        match &self.api_config {
            Some(config) => Ok(config.clone()),
            None => kube::Config::infer().await.map_err(Error::InferConfig),
        }
    }

    /// Bearer token presented to the kubelet, taken from the cluster config's
    /// token file. Kubelet authenticates it against the API server.
    fn kubelet_token(config: &kube::Config) -> Result<Option<String>> {
        let Some(path) = &config.auth_info.token_file else {
            return Ok(None);
        };
        let token = std::fs::read_to_string(path).map_err(|source| Error::ReadToken {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Some(token.trim().to_owned()))
    }

    // Kubelet serving certificates are usually self-signed.
    fn http_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(Error::HttpClient)
    }
}

impl KubeletProbe for KubeletClient {
    async fn kubelet_port(&self, node_name: &str) -> Result<u16> {
        let client = Client::try_from(self.config().await?).map_err(Error::Client)?;
        let nodes: Api<Node> = Api::all(client);
        log::debug!("Fetching node {}", node_name);

        let node = nodes.get(node_name).await.map_err(|source| Error::GetNode {
            node_name: node_name.to_owned(),
            source,
        })?;

        node.status
            .and_then(|status| status.daemon_endpoints)
            .and_then(|endpoints| endpoints.kubelet_endpoint)
            .and_then(|endpoint| u16::try_from(endpoint.port).ok())
            .filter(|port| *port != 0)
            .ok_or_else(|| Error::MissingKubeletPort {
                node_name: node_name.to_owned(),
            })
    }

    async fn cgroup_driver(&self, port: u16) -> Result<String> {
        let token = Self::kubelet_token(&self.config().await?)?;
        let url = format!(
            "{}://{}/configz",
            self.kubelet_scheme,
            host_port(&self.kubelet_host, port)
        );
        log::debug!("Querying kubelet config from {}", url);

        let mut request = Self::http_client()?.get(&url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        let configz: models::KubeletConfigz = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| Error::KubeletRequest { port, source })?
            .json()
            .await
            .map_err(|source| Error::KubeletDecode { port, source })?;

        let driver = configz.kubelet_config.cgroup_driver;
        if driver.is_empty() {
            return Ok(KUBELET_DEFAULT_CGROUP_DRIVER.to_owned());
        }
        Ok(driver)
    }
}

/// Joins host and port, bracketing bare IPv6 addresses.
fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
