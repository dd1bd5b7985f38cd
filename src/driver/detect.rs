use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use crate::formatter::PathFormatter;
use crate::fsutil;
use crate::kubelet::{self, KubeletProbe};

use super::{CgroupDriver, Error, Result};

/// How often and for how long [`detect_from_kubelet`] keeps asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(60))
    }
}

/// Infers the driver from the names of directories found below a cgroup root.
///
/// Returns `None` unless exactly one of the two `kubepods` roots is present.
///
/// # Examples
///
/// ```
/// use cgroup_pathfinder::driver::{CgroupDriver, guess_from_dir_names};
///
/// let names = ["init.scope", "kubepods.slice", "system.slice"];
/// assert_eq!(guess_from_dir_names(names), Some(CgroupDriver::Systemd));
/// assert_eq!(guess_from_dir_names(["system.slice"]), None);
/// ```
pub fn guess_from_dir_names<I, S>(names: I) -> Option<CgroupDriver>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let systemd_root = PathFormatter::Systemd.parent_dir().trim_end_matches('/');
    let cgroupfs_root = PathFormatter::Cgroupfs.parent_dir().trim_end_matches('/');

    let (mut systemd, mut cgroupfs) = (false, false);
    for name in names {
        let name = name.as_ref();
        systemd |= name == systemd_root;
        cgroupfs |= name == cgroupfs_root;
    }

    match (systemd, cgroupfs) {
        (true, false) => Some(CgroupDriver::Systemd),
        (false, true) => Some(CgroupDriver::Cgroupfs),
        _ => None,
    }
}

/// Infers the driver from the `kubepods` root directories below `cgroup_root`.
///
/// On cgroup v1 hosts, kubelet creates its hierarchy per controller, so if the
/// root itself is inconclusive the `cpu` hierarchy below it is checked too.
/// A directory that cannot be listed counts as inconclusive.
pub fn guess_from_cgroup_root(cgroup_root: impl AsRef<Path>) -> Option<CgroupDriver> {
    let cgroup_root = cgroup_root.as_ref();
    if let Some(driver) = guess_from_listing(cgroup_root) {
        return Some(driver);
    }

    let cpu_root = cgroup_root.join("cpu");
    if !cpu_root.is_dir() {
        return None;
    }
    guess_from_listing(&cpu_root)
}

fn guess_from_listing(dir: &Path) -> Option<CgroupDriver> {
    match fsutil::read_dir_names(dir) {
        Ok(names) => guess_from_dir_names(names),
        Err(err) => {
            log::debug!("Cannot guess cgroup driver: {}", err);
            None
        }
    }
}

/// Asks the kubelet of `node_name` for its configured cgroup driver.
///
/// The first attempt runs immediately; failed attempts are logged and retried
/// every `policy.interval` until `policy.timeout` has elapsed. A single attempt
/// never runs past the deadline. This can take up to the full timeout, so it
/// must not run on a latency-sensitive task.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if no attempt succeeded in time.
pub async fn detect_from_kubelet<P: KubeletProbe>(
    node_name: &str,
    probe: &P,
    policy: PollPolicy,
) -> Result<CgroupDriver> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        match tokio::time::timeout_at(deadline, probe_once(node_name, probe)).await {
            Ok(Ok(driver)) => return Ok(driver),
            Ok(Err(err)) => log::error!("guess kubelet cgroup driver failed, retry...: {}", err),
            Err(_) => break,
        }

        if Instant::now() + policy.interval > deadline {
            break;
        }
        tokio::time::sleep(policy.interval).await;
    }

    Err(Error::Timeout {
        node_name: node_name.to_owned(),
        timeout: policy.timeout,
    })
}

async fn probe_once<P: KubeletProbe>(node_name: &str, probe: &P) -> kubelet::Result<CgroupDriver> {
    let port = probe.kubelet_port(node_name).await?;
    let driver = probe.cgroup_driver(port).await?;
    Ok(driver.parse::<CgroupDriver>()?)
}

/// Determines the cgroup driver of this node.
///
/// The directory heuristic is tried first; only if it is inconclusive is the
/// kubelet asked. If that fails as well, [`CgroupDriver::Systemd`] is assumed.
/// This function always yields a driver.
pub async fn detect<P: KubeletProbe>(
    node_name: &str,
    cgroup_root: &Path,
    probe: &P,
    policy: PollPolicy,
) -> CgroupDriver {
    log::info!("Detecting cgroup driver of node {}...", node_name);
    if let Some(driver) = guess_from_cgroup_root(cgroup_root) {
        log::info!(
            "Node {} uses '{}' as cgroup driver according to the cgroup directory names",
            node_name,
            driver
        );
        return driver;
    }
    log::info!(
        "Cannot detect cgroup driver from the 'kubepods' directories in `{}`",
        cgroup_root.display()
    );

    match detect_from_kubelet(node_name, probe, policy).await {
        Ok(driver) => {
            log::info!(
                "Node {} uses '{}' as cgroup driver according to the kubelet config",
                node_name,
                driver
            );
            driver
        }
        Err(err) => {
            log::error!(
                "Cannot detect cgroup driver from kubelet, using the default '{}': {}",
                CgroupDriver::Systemd,
                err
            );
            CgroupDriver::Systemd
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FAST: PollPolicy = PollPolicy::new(Duration::from_millis(10), Duration::from_millis(200));

    /// Fails the first `failures` port lookups, then reports `driver`.
    struct FakeProbe {
        failures: usize,
        driver: &'static str,
        attempts: AtomicUsize,
    }

    impl FakeProbe {
        fn new(failures: usize, driver: &'static str) -> Self {
            Self {
                failures,
                driver,
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl KubeletProbe for FakeProbe {
        async fn kubelet_port(&self, node_name: &str) -> kubelet::Result<u16> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(kubelet::Error::MissingKubeletPort {
                    node_name: node_name.to_owned(),
                });
            }
            Ok(10250)
        }

        async fn cgroup_driver(&self, port: u16) -> kubelet::Result<String> {
            assert_eq!(port, 10250);
            Ok(self.driver.to_owned())
        }
    }

    /// Never answers.
    struct HangingProbe;

    impl KubeletProbe for HangingProbe {
        async fn kubelet_port(&self, _node_name: &str) -> kubelet::Result<u16> {
            std::future::pending().await
        }

        async fn cgroup_driver(&self, _port: u16) -> kubelet::Result<String> {
            std::future::pending().await
        }
    }

    fn cgroup_root_with(dirs: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for dir in dirs {
            std::fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        root
    }

    #[test]
    fn test_default_poll_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(10));
        assert_eq!(policy.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_guess_from_dir_names() {
        assert_eq!(
            guess_from_dir_names(["kubepods", "user.slice"]),
            Some(CgroupDriver::Cgroupfs)
        );
        assert_eq!(
            guess_from_dir_names(["kubepods.slice"]),
            Some(CgroupDriver::Systemd)
        );
        assert_eq!(guess_from_dir_names(["kubepods", "kubepods.slice"]), None);
        assert_eq!(guess_from_dir_names(["kubepods-burstable.slice"]), None);
        assert_eq!(guess_from_dir_names(Vec::<String>::new()), None);
    }

    #[test]
    fn test_guess_from_cgroup_root_v2() {
        let root = cgroup_root_with(&["kubepods.slice", "system.slice"]);
        assert_eq!(guess_from_cgroup_root(root.path()), Some(CgroupDriver::Systemd));

        let root = cgroup_root_with(&["kubepods/burstable"]);
        assert_eq!(guess_from_cgroup_root(root.path()), Some(CgroupDriver::Cgroupfs));
    }

    #[test]
    fn test_guess_from_cgroup_root_v1_cpu_hierarchy() {
        let root = cgroup_root_with(&["cpu/kubepods", "memory/kubepods"]);
        assert_eq!(guess_from_cgroup_root(root.path()), Some(CgroupDriver::Cgroupfs));
    }

    #[test]
    fn test_guess_from_cgroup_root_inconclusive() {
        let root = cgroup_root_with(&["kubepods", "kubepods.slice"]);
        assert_eq!(guess_from_cgroup_root(root.path()), None);

        let root = cgroup_root_with(&["system.slice", "cpu"]);
        assert_eq!(guess_from_cgroup_root(root.path()), None);

        // a regular file named like a kubepods root does not count
        let root = cgroup_root_with(&[]);
        std::fs::write(root.path().join("kubepods.slice"), "").unwrap();
        assert_eq!(guess_from_cgroup_root(root.path()), None);

        assert_eq!(guess_from_cgroup_root("/definitely/does/not/exist"), None);
    }

    #[tokio::test]
    async fn test_detect_from_kubelet_first_attempt() {
        let probe = FakeProbe::new(0, "cgroupfs");
        let driver = detect_from_kubelet("node", &probe, FAST).await.unwrap();
        assert_eq!(driver, CgroupDriver::Cgroupfs);
        assert_eq!(probe.attempts(), 1);
    }

    #[tokio::test]
    async fn test_detect_from_kubelet_retries() {
        let probe = FakeProbe::new(2, "systemd");
        let driver = detect_from_kubelet("node", &probe, FAST).await.unwrap();
        assert_eq!(driver, CgroupDriver::Systemd);
        assert_eq!(probe.attempts(), 3);
    }

    #[tokio::test]
    async fn test_detect_from_kubelet_invalid_driver_times_out() {
        let probe = FakeProbe::new(0, "none");
        let err = detect_from_kubelet("node", &probe, FAST).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { ref node_name, .. } if node_name == "node"));
        assert!(probe.attempts() > 1);
    }

    #[tokio::test]
    async fn test_detect_from_kubelet_hanging_probe_respects_deadline() {
        let started = std::time::Instant::now();
        let err = detect_from_kubelet("node", &HangingProbe, FAST).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_detect_prefers_directory_names() {
        let root = cgroup_root_with(&["kubepods"]);
        let probe = FakeProbe::new(0, "systemd");

        let driver = detect("node", root.path(), &probe, FAST).await;
        assert_eq!(driver, CgroupDriver::Cgroupfs);
        assert_eq!(probe.attempts(), 0);
    }

    #[tokio::test]
    async fn test_detect_falls_back_to_kubelet() {
        let root = cgroup_root_with(&[]);
        let probe = FakeProbe::new(1, "cgroupfs");

        let driver = detect("node", root.path(), &probe, FAST).await;
        assert_eq!(driver, CgroupDriver::Cgroupfs);
        assert_eq!(probe.attempts(), 2);
    }

    #[tokio::test]
    async fn test_detect_defaults_to_systemd() {
        let root = cgroup_root_with(&[]);
        let probe = FakeProbe::new(usize::MAX, "cgroupfs");

        let started = std::time::Instant::now();
        let driver = detect("node", root.path(), &probe, FAST).await;
        assert_eq!(driver, CgroupDriver::Systemd);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
