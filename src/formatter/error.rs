/// Errors that may occur when formatting or parsing cgroup directory names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("failed to parse container id `{0}`: missing `://` separator")]
    InvalidContainerId(String),
    #[error("unknown container runtime in id `{0}`")]
    UnknownRuntime(String),
    #[error("failed to parse pod id from cgroup directory `{0}`")]
    InvalidPodDir(String),
    #[error("failed to parse container id from cgroup directory `{0}`")]
    InvalidContainerDir(String),
}

pub type Result<T> = std::result::Result<T, Error>;
