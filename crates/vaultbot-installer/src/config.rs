//! Configuration types for installation.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{InstallError, Result};

/// Default agent release.
pub const DEFAULT_VERSION: &str = "1.13.0";

/// Default download URL template.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://gitlab.com/msvechla/vaultbot/-/releases/v{version}/downloads/vaultbot_{version}_linux_{arch}{extension}";

/// Default checksum list URL template.
pub const DEFAULT_CHECKSUM_URL: &str =
    "https://gitlab.com/msvechla/vaultbot/-/releases/v{version}/downloads/vaultbot_{version}_checksums.txt";

/// CPU architecture of a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
}

impl Arch {
    /// Maps a machine name (`uname -m` or Rust's `ARCH`) to a release architecture.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedArch`] for anything other than
    /// `x86_64`/`amd64` and `aarch64`/`arm64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultbot_installer::Arch;
    ///
    /// assert_eq!(Arch::from_machine("x86_64").unwrap(), Arch::Amd64);
    /// assert_eq!(Arch::from_machine("aarch64").unwrap(), Arch::Arm64);
    /// ```
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine {
            "x86_64" | "amd64" => Ok(Self::Amd64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            other => Err(InstallError::UnsupportedArch {
                arch: other.to_string(),
            }),
        }
    }

    /// Returns the architecture of the running host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host architecture has no release.
    pub fn host() -> Result<Self> {
        Self::from_machine(std::env::consts::ARCH)
    }

    /// Returns the name used in release file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to install the agent.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Release version, without the leading `v`.
    pub version: String,

    /// Download URL template (`{version}`, `{arch}`, `{extension}`).
    pub download_url: String,

    /// Archive extension including the leading dot.
    pub download_extension: String,

    /// Whether to verify the archive against the checksum list.
    pub checksum_verify: bool,

    /// Checksum list URL template.
    pub checksum_url: String,

    /// Name of the binary inside the archive and of the symlink.
    pub binary_name: String,

    /// Directory holding the symlink.
    pub bin_dir: PathBuf,

    /// Directory holding every extracted release.
    pub archives_top_dir: PathBuf,

    /// HTTP(S) proxy for downloads.
    pub proxy_url: Option<Url>,

    /// Target architecture.
    pub arch: Arch,

    /// Request timeout.
    pub timeout: Duration,
}

impl InstallConfig {
    /// Creates a configuration with the stock defaults for `arch`.
    #[must_use]
    pub fn new(arch: Arch) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            download_extension: ".tar.gz".to_string(),
            checksum_verify: true,
            checksum_url: DEFAULT_CHECKSUM_URL.to_string(),
            binary_name: "vaultbot".to_string(),
            bin_dir: PathBuf::from("/usr/local/bin"),
            archives_top_dir: PathBuf::from("/opt/vaultbot"),
            proxy_url: None,
            arch,
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the release version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the download proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Url) -> Self {
        self.proxy_url = Some(proxy);
        self
    }

    /// Sets the directory holding every extracted release.
    #[must_use]
    pub fn with_archives_top_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archives_top_dir = dir.into();
        self
    }

    /// Sets the directory holding the symlink.
    #[must_use]
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = dir.into();
        self
    }

    /// Returns `<archives_top_dir>/v<version>`.
    #[must_use]
    pub fn extract_dir(&self) -> PathBuf {
        self.archives_top_dir.join(format!("v{}", self.version))
    }

    /// Returns `<extract_dir><extension>`, where the downloaded archive is kept.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        let mut path = self.extract_dir().into_os_string();
        path.push(&self.download_extension);
        PathBuf::from(path)
    }

    /// Returns the extracted binary path.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        self.extract_dir().join(&self.binary_name)
    }

    /// Returns the symlink path.
    #[must_use]
    pub fn link_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binary_name)
    }

    /// Expands a URL template with this configuration's values.
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{version}", &self.version)
            .replace("{arch}", self.arch.as_str())
            .replace("{extension}", &self.download_extension)
    }

    /// Returns the download URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the expanded template is not a valid URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultbot_installer::{Arch, InstallConfig};
    ///
    /// let config = InstallConfig::new(Arch::Arm64);
    /// assert_eq!(
    ///     config.download_url().unwrap().as_str(),
    ///     "https://gitlab.com/msvechla/vaultbot/-/releases/v1.13.0/downloads/vaultbot_1.13.0_linux_arm64.tar.gz"
    /// );
    /// ```
    pub fn download_url(&self) -> Result<Url> {
        parse_url(&self.expand(&self.download_url))
    }

    /// Returns the checksum list URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the expanded template is not a valid URL.
    pub fn checksum_url(&self) -> Result<Url> {
        parse_url(&self.expand(&self.checksum_url))
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| InstallError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
