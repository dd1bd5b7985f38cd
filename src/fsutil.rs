use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when listing a directory fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to list directory `{path}`: {source}")]
pub struct ReadDirError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Returns the names of all subdirectories of `path`.
///
/// Entries whose names are not valid UTF-8 are skipped, as are entries whose
/// type cannot be determined.
///
/// # Errors
///
/// Returns a [`ReadDirError`] if the directory itself cannot be read.
///
/// # Example
/// ```no_run
/// # use cgroup_pathfinder::fsutil;
/// let names = fsutil::read_dir_names("/sys/fs/cgroup")?;
/// println!("{names:?}");
/// # Ok::<(), fsutil::ReadDirError>(())
/// ```
pub fn read_dir_names(path: impl AsRef<Path>) -> Result<Vec<String>, ReadDirError> {
    let path = path.as_ref();
    let to_err = |source| ReadDirError {
        path: path.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(path).map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        if !entry.file_type().is_ok_and(|ty| ty.is_dir()) {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }

    Ok(names)
}
