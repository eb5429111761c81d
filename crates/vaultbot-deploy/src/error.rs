//! Error types for deployment convergence.

use std::path::PathBuf;
use thiserror::Error;

use vaultbot_core::{CoreError, ValidationError};
use vaultbot_installer::InstallError;
use vaultbot_systemd::UnitError;

/// Result type alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors that can occur while converging a deployment.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A bundle is missing a required parameter.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Bundle model or rendering error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Installing the agent failed.
    #[error("Install failed: {0}")]
    Install(#[from] InstallError),

    /// The service manager rejected a request.
    #[error("Unit management failed: {0}")]
    Unit(#[from] UnitError),

    /// The manifest could not be parsed.
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        /// Manifest path, or `<inline>` for in-memory manifests.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest parsed but holds an unusable value.
    #[error("Invalid manifest value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No bundle with this name is declared.
    #[error("Bundle not found: {name}")]
    BundleNotFound {
        /// Requested bundle name.
        name: String,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
