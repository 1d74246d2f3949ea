//! Filesystem operations the bootstrap performs, behind a trait so the
//! workspace and script logic can be exercised against a recording double.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{SetupError, SetupResult};

#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

pub trait Filesystem {
    /// Recursively delete `path`. A missing path is not an error.
    fn remove_tree(&self, path: &Path) -> SetupResult<()>;

    fn create_dir_all(&self, path: &Path) -> SetupResult<()>;

    /// Byte-for-byte copy of `from` to `to`.
    fn copy_file(&self, from: &Path, to: &Path) -> SetupResult<()>;

    /// Append `contents` to `path`, creating the file (not its parents).
    fn append(&self, path: &Path, contents: &str) -> SetupResult<()>;

    fn set_executable(&self, path: &Path) -> SetupResult<()>;

    fn canonicalize(&self, path: &Path) -> SetupResult<PathBuf>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn remove_tree(&self, path: &Path) -> SetupResult<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SetupError::filesystem("remove", path, err)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> SetupResult<()> {
        fs::create_dir_all(path).map_err(|err| SetupError::filesystem("create", path, err))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> SetupResult<()> {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|err| SetupError::filesystem("copy", from, err))
    }

    fn append(&self, path: &Path, contents: &str) -> SetupResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| SetupError::filesystem("open", path, err))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| SetupError::filesystem("append to", path, err))
    }

    #[cfg(unix)]
    fn set_executable(&self, path: &Path) -> SetupResult<()> {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .map_err(|err| SetupError::filesystem("stat", path, err))?
            .permissions();
        perms.set_mode(EXECUTABLE_MODE);
        fs::set_permissions(path, perms)
            .map_err(|err| SetupError::filesystem("chmod", path, err))
    }

    #[cfg(not(unix))]
    fn set_executable(&self, path: &Path) -> SetupResult<()> {
        fs::metadata(path)
            .map(|_| ())
            .map_err(|err| SetupError::filesystem("stat", path, err))
    }

    fn canonicalize(&self, path: &Path) -> SetupResult<PathBuf> {
        fs::canonicalize(path).map_err(|err| SetupError::filesystem("resolve", path, err))
    }
}
