//! Managed file storage.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{DeployError, Result};

/// Mode of config and unit files.
pub const FILE_MODE: u32 = 0o644;

/// Mode of managed directories.
pub const DIR_MODE: u32 = 0o755;

/// Idempotent file operations. Every method reports whether it changed anything.
pub trait ConfigStore: Send + Sync {
    /// Makes `path` hold exactly `content` with `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write(&self, path: &Path, content: &[u8], mode: u32) -> Result<bool>;

    /// Removes the file at `path` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    fn remove(&self, path: &Path) -> Result<bool>;

    /// Creates the directory at `path` with `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn ensure_dir(&self, path: &Path, mode: u32) -> Result<bool>;

    /// Removes the directory at `path` and everything in it.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing directory cannot be removed.
    fn remove_dir(&self, path: &Path) -> Result<bool>;
}

/// Stores files on the local filesystem.
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the target, so readers never see a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsConfigStore;

impl FsConfigStore {
    /// Creates a store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn current_mode(path: &Path) -> Option<u32> {
    fs::metadata(path)
        .ok()
        .map(|meta| meta.permissions().mode() & 0o7777)
}

impl ConfigStore for FsConfigStore {
    fn write(&self, path: &Path, content: &[u8], mode: u32) -> Result<bool> {
        match fs::read(path) {
            Ok(existing) if existing == content => {
                if current_mode(path) == Some(mode) {
                    debug!(path = %path.display(), "File up to date");
                    return Ok(false);
                }
                fs::set_permissions(path, fs::Permissions::from_mode(mode))
                    .map_err(DeployError::io(path))?;
                info!(path = %path.display(), mode = %format_args!("{mode:o}"), "File mode updated");
                return Ok(true);
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(DeployError::io(path)(e)),
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir).map_err(DeployError::io(dir))?;
        temp.write_all(content).map_err(DeployError::io(temp.path()))?;
        temp.as_file()
            .sync_all()
            .map_err(DeployError::io(temp.path()))?;
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(mode))
            .map_err(DeployError::io(temp.path()))?;
        temp.persist(path)
            .map_err(|e| DeployError::io(path)(e.error))?;

        info!(path = %path.display(), bytes = content.len(), "File written");
        Ok(true)
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "File removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DeployError::io(path)(e)),
        }
    }

    fn ensure_dir(&self, path: &Path, mode: u32) -> Result<bool> {
        let existed = path.is_dir();
        fs::create_dir_all(path).map_err(DeployError::io(path))?;
        if existed && current_mode(path) == Some(mode) {
            return Ok(false);
        }
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(DeployError::io(path))?;
        Ok(true)
    }

    fn remove_dir(&self, path: &Path) -> Result<bool> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                info!(path = %path.display(), "Directory removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DeployError::io(path)(e)),
        }
    }
}
