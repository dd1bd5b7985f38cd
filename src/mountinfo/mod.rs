//! Locating the cgroup hierarchy that holds the `kubepods` roots.
mod detect;
mod error;
mod parser;

pub use detect::{CgroupMount, CgroupVersion, detect_cgroup_mount, detect_validated_cgroup_mount};
pub use error::{Error, Result};
