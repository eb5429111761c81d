//! On-disk installation layout.
//!
//! ```text
//! <archives_top_dir>/                 0755
//! <archives_top_dir>/v<version>/      0755
//! <archives_top_dir>/v<version>.tar.gz
//! <archives_top_dir>/v<version>/<binary_name>   0755
//! <bin_dir>/<binary_name> -> <archives_top_dir>/v<version>/<binary_name>
//! ```

use std::fs::Permissions;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::config::InstallConfig;
use crate::error::{InstallError, Result};
use crate::fetcher::{ArtifactFetcher, ArtifactRequest};

const DIR_MODE: u32 = 0o755;
const BINARY_MODE: u32 = 0o755;

/// Outcome of an install pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Extracted binary.
    pub binary: PathBuf,
    /// Symlink pointing at the binary.
    pub link: PathBuf,
    /// Whether anything on disk was changed.
    pub changed: bool,
}

/// Converges the installation described by an [`InstallConfig`].
#[derive(Debug)]
pub struct Installer<F> {
    config: InstallConfig,
    fetcher: F,
}

impl<F: ArtifactFetcher> Installer<F> {
    /// Creates an installer.
    pub const fn new(config: InstallConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Returns the install configuration.
    #[must_use]
    pub const fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Installs the configured release and points the symlink at it.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created, the fetch fails, or
    /// the symlink cannot be updated.
    pub async fn install(&self) -> Result<InstallReport> {
        ensure_dir(&self.config.archives_top_dir).await?;
        ensure_dir(&self.config.extract_dir()).await?;

        let already_present = fs::try_exists(self.config.binary_path())
            .await
            .unwrap_or(false);
        let request = ArtifactRequest::from_config(&self.config)?;
        let binary = self.fetcher.ensure_installed(&request).await?;

        fs::set_permissions(&binary, Permissions::from_mode(BINARY_MODE))
            .await
            .map_err(InstallError::io(&binary))?;

        fs::create_dir_all(&self.config.bin_dir)
            .await
            .map_err(InstallError::io(&self.config.bin_dir))?;
        let link = self.config.link_path();
        let relinked = ensure_symlink(&link, &binary).await?;

        let changed = !already_present || relinked;
        if changed {
            info!(
                version = %self.config.version,
                binary = %binary.display(),
                link = %link.display(),
                "Installed vaultbot"
            );
        } else {
            debug!(version = %self.config.version, "vaultbot already installed");
        }

        Ok(InstallReport {
            binary,
            link,
            changed,
        })
    }

    /// Removes the symlink, the release and the archive directory.
    ///
    /// Returns true if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing path cannot be removed.
    pub async fn uninstall(&self) -> Result<bool> {
        let mut changed = remove_file(&self.config.link_path()).await?;
        changed |= remove_file(&self.config.binary_path()).await?;
        changed |= remove_file(&self.config.archive_path()).await?;
        changed |= remove_dir(&self.config.extract_dir()).await?;
        changed |= remove_dir(&self.config.archives_top_dir).await?;

        if changed {
            info!(version = %self.config.version, "Removed vaultbot installation");
        }
        Ok(changed)
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(InstallError::io(path))?;
    fs::set_permissions(path, Permissions::from_mode(DIR_MODE))
        .await
        .map_err(InstallError::io(path))
}

/// Points `link` at `target`, replacing whatever is there. Returns true if it changed.
async fn ensure_symlink(link: &Path, target: &Path) -> Result<bool> {
    match fs::read_link(link).await {
        Ok(current) if current == target => return Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        // Stale link, or a plain file in the way.
        _ => {
            remove_file(link).await?;
        }
    }

    fs::symlink(target, link)
        .await
        .map_err(InstallError::io(link))?;
    Ok(true)
}

async fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InstallError::io(path)(e)),
    }
}

async fn remove_dir(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InstallError::io(path)(e)),
    }
}
