//! # Vaultbot Installer
//!
//! Installs a vaultbot release from its published archive.
//!
//! ## Features
//!
//! - **URL templates**: `{version}`, `{arch}` and `{extension}` placeholders
//! - **Checksum verification**: SHA-256 against the release checksum list
//! - **Idempotent**: nothing is downloaded when the release is already extracted
//! - **Proxy support**: optional HTTP(S) proxy for both downloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vaultbot_installer::{Arch, HttpArtifactFetcher, InstallConfig, Installer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = InstallConfig::new(Arch::host()?).with_version("1.13.0");
//!     let installer = Installer::new(config, HttpArtifactFetcher::default());
//!
//!     let report = installer.install().await?;
//!     println!("{} -> {}", report.link.display(), report.binary.display());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
mod config;
mod error;
mod fetcher;
mod installer;

pub use config::{Arch, InstallConfig, DEFAULT_CHECKSUM_URL, DEFAULT_DOWNLOAD_URL, DEFAULT_VERSION};
pub use error::{InstallError, Result};
pub use fetcher::{extract, ArtifactFetcher, ArtifactRequest, HttpArtifactFetcher};
pub use installer::{InstallReport, Installer};
