//! Filesystem layout.
//!
//! Paths come in two flavours: the *runtime* path the agent and systemd see
//! (`/etc/vaultbot/vaultbot-www.conf`), and the *managed* path this tool
//! writes to, which is the runtime path under an optional staging root.

use std::path::{Path, PathBuf};

/// Maps runtime paths to the paths actually written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    root: Option<PathBuf>,
}

impl Layout {
    /// Writes to runtime paths directly.
    #[must_use]
    pub const fn system() -> Self {
        Self { root: None }
    }

    /// Writes every path under `root`.
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Returns the staging root, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Returns the managed path for a runtime path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use vaultbot_deploy::Layout;
    ///
    /// let layout = Layout::rooted("/tmp/stage");
    /// assert_eq!(
    ///     layout.resolve(Path::new("/etc/vaultbot")),
    ///     Path::new("/tmp/stage/etc/vaultbot")
    /// );
    /// assert_eq!(Layout::system().resolve(Path::new("/etc/vaultbot")), Path::new("/etc/vaultbot"));
    /// ```
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
        }
    }
}

/// Runtime locations of the agent's config and unit files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Config directory.
    pub etc_dir: PathBuf,
    /// Unit file directory.
    pub systemd_dir: PathBuf,
}

impl ConfigPaths {
    /// Returns `<etc_dir>/vaultbot.conf`.
    #[must_use]
    pub fn global_config(&self) -> PathBuf {
        self.etc_dir.join("vaultbot.conf")
    }

    /// Returns `<etc_dir>/vaultbot-<name>.conf`.
    #[must_use]
    pub fn bundle_config(&self, name: &str) -> PathBuf {
        self.etc_dir.join(format!("vaultbot-{name}.conf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> ConfigPaths {
        ConfigPaths {
            etc_dir: PathBuf::from("/etc/vaultbot"),
            systemd_dir: PathBuf::from("/etc/systemd/system"),
        }
    }

    #[test]
    fn test_config_paths() {
        let paths = paths();
        assert_eq!(paths.global_config(), PathBuf::from("/etc/vaultbot/vaultbot.conf"));
        assert_eq!(
            paths.bundle_config("test_service"),
            PathBuf::from("/etc/vaultbot/vaultbot-test_service.conf")
        );
        // The unit template refers to bundle files through the instance specifier.
        assert_eq!(
            paths.bundle_config("%i"),
            PathBuf::from("/etc/vaultbot/vaultbot-%i.conf")
        );
    }

    #[test]
    fn test_relative_path_under_root() {
        let layout = Layout::rooted("/stage");
        assert_eq!(layout.resolve(Path::new("etc")), PathBuf::from("/stage/etc"));
        assert_eq!(layout.root(), Some(Path::new("/stage")));
    }
}
