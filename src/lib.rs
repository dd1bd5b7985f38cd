//! Cgroup Pathfinder: naming of the kubelet `kubepods` cgroup hierarchy.
//!
//! Kubelet names pod and container cgroups differently depending on whether
//! it runs with the `cgroupfs` or the `systemd` cgroup driver. This library
//! detects the driver used on the current node and converts between
//! Kubernetes identifiers (QoS class, pod UID, container ID) and the
//! directory names found in the cgroup filesystem.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::Config;
use driver::{CgroupDriver, PollPolicy};
use formatter::{FormatterSelector, PathFormatter};
use kubelet::KubeletProbe;
use pod::QosClass;
use tokio::task::JoinHandle;

pub mod config;
pub mod driver;
pub mod formatter;
pub mod fsutil;
pub mod kubelet;
pub mod mountinfo;
pub mod pod;

const DEFAULT_CGROUP_ROOT: &str = "sys/fs/cgroup";

/// The `kubepods` layout selected for this node.
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub driver: CgroupDriver,
    pub parent_dir: &'static str,
    pub qos_dirs: BTreeMap<QosClass, &'static str>,
}

impl Layout {
    pub fn of(formatter: PathFormatter) -> Self {
        Self {
            driver: formatter.driver(),
            parent_dir: formatter.parent_dir(),
            qos_dirs: QosClass::ALL
                .into_iter()
                .map(|qos| (qos, formatter.qos_dir(qos)))
                .collect(),
        }
    }
}

/// Returns the cgroup directory that holds the `kubepods` roots.
///
/// An explicitly configured root wins. Otherwise the host's mountinfo is
/// consulted, falling back to `/sys/fs/cgroup` below the root filesystem.
pub fn resolve_cgroup_root(config: &Config) -> PathBuf {
    if let Some(root) = &config.cgroup_root {
        return root.clone();
    }

    let rootfs = config.rootfs.as_path();
    let mountinfo = rootfs.join("proc/1/mountinfo");
    // Validation is only meaningful when the mount point is in our own mount namespace.
    let detected = if rootfs == Path::new("/") {
        mountinfo::detect_validated_cgroup_mount(&mountinfo)
    } else {
        mountinfo::detect_cgroup_mount(&mountinfo)
    };

    match detected {
        Ok(mount) => {
            log::debug!(
                "Detected cgroup {:?} mount point: {}",
                mount.version,
                mount.mount_point.display()
            );
            rootfs.join(
                mount
                    .mount_point
                    .strip_prefix("/")
                    .unwrap_or(mount.mount_point.as_path()),
            )
        }
        Err(err) => {
            let fallback = rootfs.join(DEFAULT_CGROUP_ROOT);
            log::warn!(
                "Failed to detect cgroup mount, using `{}`: {}",
                fallback.display(),
                err
            );
            fallback
        }
    }
}

/// Formatter selector seeded for this node, plus the detection task that
/// may still rebind it.
#[derive(Debug)]
pub struct Detection {
    pub selector: Arc<FormatterSelector>,
    /// Background detection; `None` if the driver is configured or no node
    /// name is known.
    pub task: Option<JoinHandle<CgroupDriver>>,
}

/// Seeds the formatter selector from the cgroup directory names and, unless a
/// driver is configured explicitly, starts the authoritative detection on its
/// own task.
///
/// The returned selector is usable right away. Must be called within a tokio
/// runtime.
pub fn start(config: &Config, cgroup_root: &Path) -> Detection {
    let selector = Arc::new(FormatterSelector::seed(cgroup_root));

    let task = if let Some(driver) = config.cgroup_driver {
        log::info!("Using configured cgroup driver '{}'", driver);
        selector.rebind(driver);
        None
    } else if let Some(node_name) = &config.node_name {
        let probe = kubelet::KubeletClient::new(&config.kubelet_host, &config.kubelet_scheme);
        Some(spawn_detection(
            Arc::clone(&selector),
            node_name.clone(),
            cgroup_root.to_path_buf(),
            probe,
            config.poll_policy,
        ))
    } else {
        log::warn!("`NODE_NAME` is not set, skipping cgroup driver detection from kubelet");
        None
    };

    Detection { selector, task }
}

/// Runs [`driver::detect`] on a new task and rebinds `selector` with the result.
pub fn spawn_detection<P>(
    selector: Arc<FormatterSelector>,
    node_name: String,
    cgroup_root: PathBuf,
    probe: P,
    policy: PollPolicy,
) -> JoinHandle<CgroupDriver>
where
    P: KubeletProbe + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let driver = driver::detect(&node_name, &cgroup_root, &probe, policy).await;
        selector.rebind(driver);
        driver
    })
}

/// Runs cgroup driver detection for this node and returns the final layout.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the detection task
/// panicked.
pub async fn run() -> Result<Layout, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let cgroup_root = resolve_cgroup_root(&config);
    log::debug!("Final Cgroup Root: {}", cgroup_root.display());

    let Detection { selector, task } = start(&config, &cgroup_root);
    log::info!(
        "Seeded cgroup path formatter for '{}'",
        selector.current().driver()
    );

    if let Some(task) = task {
        task.await?;
    }

    Ok(Layout::of(selector.current()))
}
