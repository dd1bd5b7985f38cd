use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::driver::{self, CgroupDriver};

use super::PathFormatter;

/// Holds the formatter currently used for all cgroup path computations.
///
/// The selector is read on every path computation and written at most a few
/// times per process, typically once when seeded and once after
/// [`driver::detect`] has finished. Writes are last-writer-wins.
///
/// # Examples
///
/// ```
/// use cgroup_pathfinder::driver::CgroupDriver;
/// use cgroup_pathfinder::formatter::{FormatterSelector, PathFormatter};
///
/// let selector = FormatterSelector::new(PathFormatter::Systemd);
/// selector.rebind(CgroupDriver::Cgroupfs);
/// assert_eq!(selector.current(), PathFormatter::Cgroupfs);
/// ```
#[derive(Debug)]
pub struct FormatterSelector {
    active: AtomicU8,
}

const SYSTEMD: u8 = 0;
const CGROUPFS: u8 = 1;

impl FormatterSelector {
    pub fn new(formatter: PathFormatter) -> Self {
        Self {
            active: AtomicU8::new(encode(formatter)),
        }
    }

    /// Creates a selector from the `kubepods` directories below `cgroup_root`.
    ///
    /// Only the directory heuristic is used, so this never blocks on the
    /// network. If it is inconclusive the systemd formatter is selected.
    pub fn seed(cgroup_root: impl AsRef<Path>) -> Self {
        let cgroup_root = cgroup_root.as_ref();
        match driver::guess_from_cgroup_root(cgroup_root) {
            Some(driver) => {
                log::info!(
                    "Using '{}' as cgroup driver guessed from the cgroup directory names",
                    driver
                );
                Self::new(PathFormatter::for_driver(driver))
            }
            None => {
                log::debug!(
                    "Cannot guess cgroup driver from the 'kubepods' directories in `{}`",
                    cgroup_root.display()
                );
                Self::new(PathFormatter::Systemd)
            }
        }
    }

    /// Returns the active formatter.
    pub fn current(&self) -> PathFormatter {
        decode(self.active.load(Ordering::Acquire))
    }

    /// Makes the formatter of `driver` the active one.
    pub fn rebind(&self, driver: CgroupDriver) {
        let formatter = PathFormatter::for_driver(driver);
        let previous = decode(self.active.swap(encode(formatter), Ordering::AcqRel));
        if previous != formatter {
            log::info!(
                "Switched cgroup path formatter from '{}' to '{}'",
                previous.driver(),
                driver
            );
        }
    }

    /// Like [`rebind`](Self::rebind), but for a raw driver name.
    ///
    /// Unsupported names are logged and leave the active formatter untouched.
    /// Returns whether the name was accepted.
    pub fn rebind_name(&self, name: &str) -> bool {
        match name.parse::<CgroupDriver>() {
            Ok(driver) => {
                self.rebind(driver);
                true
            }
            Err(err) => {
                log::warn!("cgroup driver formatter not supported: {}", err);
                false
            }
        }
    }
}

fn encode(formatter: PathFormatter) -> u8 {
    match formatter {
        PathFormatter::Systemd => SYSTEMD,
        PathFormatter::Cgroupfs => CGROUPFS,
    }
}

fn decode(tag: u8) -> PathFormatter {
    match tag {
        CGROUPFS => PathFormatter::Cgroupfs,
        _ => PathFormatter::Systemd,
    }
}
