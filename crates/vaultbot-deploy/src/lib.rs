//! # Vaultbot Deploy
//!
//! Converges a host to a vaultbot deployment manifest: the agent binary, the
//! global config file, the systemd unit templates, and one config file plus
//! timer instance per bundle.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Deployment                         │
//! │  ┌────────────┐  ┌─────────────┐  ┌───────────────────┐  │
//! │  │ Installer  │  │ ConfigStore │  │   UnitManager     │  │
//! │  │ (fetcher)  │  │  (files)    │  │   (systemctl)     │  │
//! │  └────────────┘  └─────────────┘  └───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │   BundlePlan: validate → render → write → enable/restart │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vaultbot_deploy::{Deployment, FsConfigStore, Layout, Manifest};
//! use vaultbot_installer::HttpArtifactFetcher;
//! use vaultbot_systemd::SystemdUnitManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manifest = Manifest::from_path(Path::new("/etc/vaultbot/deploy.yaml"))?;
//!     let deployment = Deployment::from_manifest(manifest, Layout::system())?;
//!
//!     let report = deployment
//!         .converge(
//!             HttpArtifactFetcher::default(),
//!             &FsConfigStore::new(),
//!             &SystemdUnitManager::new(),
//!         )
//!         .await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod deployment;
mod error;
mod layout;
mod lifecycle;
mod manifest;
mod store;

pub use deployment::{BundleFailure, ConvergenceReport, Deployment};
pub use error::{DeployError, Result};
pub use layout::{ConfigPaths, Layout};
pub use lifecycle::{plan_bundle, BundleOutcome, BundlePlan, BundleTarget};
pub use manifest::Manifest;
pub use store::{ConfigStore, FsConfigStore, DIR_MODE, FILE_MODE};
