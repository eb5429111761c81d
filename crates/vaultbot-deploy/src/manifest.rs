//! Deployment manifest.
//!
//! A manifest is a YAML document with the deployment parameters at the top
//! level, the shared agent settings under `settings:` and one entry per
//! bundle under `bundles:`.
//!
//! ```yaml
//! version: 1.13.0
//! on_calendar: daily
//! settings:
//!   vault_addr: https://vault.example.com
//!   vault_auth_method: approle
//!   vault_app_role_role_id: 3c1e...
//!   vault_app_role_secret_id: { file: /etc/vaultbot/secret-id }
//! bundles:
//!   www:
//!     pki_mount: pki
//!     pki_role_name: web
//!     pki_common_name: www.example.com
//!     pki_cert_path: /etc/ssl/www.pem
//!   old:
//!     ensure: absent
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use vaultbot_core::{AgentSettings, BundleDefinition, Ensure};
use vaultbot_installer::{DEFAULT_CHECKSUM_URL, DEFAULT_DOWNLOAD_URL, DEFAULT_VERSION};

use crate::error::{DeployError, Result};

/// Everything the deployment converges to.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Whether the agent should be installed at all.
    pub ensure: Ensure,

    /// Agent release, without the leading `v`.
    pub version: String,

    /// Download URL template (`{version}`, `{arch}`, `{extension}`).
    pub download_url: String,

    /// Archive extension including the leading dot.
    pub download_extension: String,

    /// Whether to verify the archive against the checksum list.
    pub checksum_verify: bool,

    /// Checksum list URL template.
    pub checksum_url: String,

    /// Binary and symlink name.
    pub binary_name: String,

    /// Directory holding the symlink.
    pub bin_dir: PathBuf,

    /// Directory holding every extracted release.
    pub archives_top_dir: PathBuf,

    /// HTTP(S) proxy for downloads.
    pub proxy_url: Option<String>,

    /// Directory holding the global and per-bundle config files.
    pub etc_dir: PathBuf,

    /// Whether the unit templates and bundle instances are managed.
    pub service_manage: bool,

    /// Directory the unit templates are written to.
    pub systemd_dir: PathBuf,

    /// Timer `OnCalendar=`.
    pub on_calendar: String,

    /// Timer `OnBootSec=`; empty omits it.
    pub on_boot_sec: String,

    /// Timer `RandomizedDelaySec=`; empty omits it.
    pub randomized_delay_sec: String,

    /// Service `ExecStart=`; defaults to `<bin_dir>/<binary_name>`.
    pub exec_start: Option<String>,

    /// Service `SyslogIdentifier=`.
    pub syslog_identifier: String,

    /// Agent settings shared by every bundle.
    pub settings: AgentSettings,

    /// Bundles by name.
    pub bundles: BTreeMap<String, BundleDefinition>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            ensure: Ensure::Present,
            version: DEFAULT_VERSION.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            download_extension: ".tar.gz".to_string(),
            checksum_verify: true,
            checksum_url: DEFAULT_CHECKSUM_URL.to_string(),
            binary_name: "vaultbot".to_string(),
            bin_dir: PathBuf::from("/usr/local/bin"),
            archives_top_dir: PathBuf::from("/opt/vaultbot"),
            proxy_url: None,
            etc_dir: PathBuf::from("/etc/vaultbot"),
            service_manage: true,
            systemd_dir: PathBuf::from("/etc/systemd/system"),
            on_calendar: "daily".to_string(),
            on_boot_sec: "15min".to_string(),
            randomized_delay_sec: "15min".to_string(),
            exec_start: None,
            syslog_identifier: "vaultbot-%i".to_string(),
            settings: AgentSettings::default(),
            bundles: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Parses a manifest from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Manifest`] if the document is malformed or holds
    /// an unknown auth method.
    pub fn parse(yaml: &str) -> Result<Self> {
        Self::parse_with_origin(yaml, Path::new("<inline>"))
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(DeployError::io(path))?;
        Self::parse_with_origin(&yaml, path)
    }

    fn parse_with_origin(yaml: &str, origin: &Path) -> Result<Self> {
        // An empty document is an all-defaults manifest.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| DeployError::Manifest {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Returns the `ExecStart=` command line.
    #[must_use]
    pub fn exec_start(&self) -> String {
        self.exec_start.clone().unwrap_or_else(|| {
            self.bin_dir
                .join(&self.binary_name)
                .display()
                .to_string()
        })
    }
}
