//! Error types for unit management.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unit operations.
pub type Result<T> = std::result::Result<T, UnitError>;

/// Errors that can occur while controlling systemd units.
#[derive(Debug, Error)]
pub enum UnitError {
    /// `systemctl` ran but exited unsuccessfully.
    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        /// Full command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },

    /// `systemctl` could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
