//! Error types for installation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Errors that can occur while installing the agent.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The HTTP request could not be completed.
    #[error("Failed to download {url}: {source}")]
    Download {
        /// Requested URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP error downloading {url}: {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A URL or URL template is malformed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The checksum list has no entry for the archive.
    #[error("No checksum for {file} in {url}")]
    ChecksumNotFound {
        /// Archive file name.
        file: String,
        /// Checksum list URL.
        url: String,
    },

    /// Downloaded archive does not match its published checksum.
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Archive file name.
        file: String,
        /// Published checksum.
        expected: String,
        /// Checksum of the downloaded bytes.
        actual: String,
    },

    /// The archive format cannot be extracted.
    #[error("Unsupported archive extension '{extension}' (expected .tar.gz, .tgz or .zip)")]
    UnsupportedArchive {
        /// Configured extension.
        extension: String,
    },

    /// A zip archive could not be read or unpacked.
    #[error("Failed to extract {path}: {source}")]
    Extract {
        /// Archive path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The host architecture has no published release.
    #[error("Unsupported architecture '{arch}'")]
    UnsupportedArch {
        /// Machine name as reported by the host.
        arch: String,
    },

    /// Extraction finished but the expected binary is not there.
    #[error("Archive did not contain expected binary {path}")]
    BinaryMissing {
        /// Expected binary path.
        path: PathBuf,
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

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_checksum_mismatch() {
        let err = InstallError::ChecksumMismatch {
            file: "vaultbot_1.13.0_linux_amd64.tar.gz".to_string(),
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for vaultbot_1.13.0_linux_amd64.tar.gz: expected abc123, got def456"
        );
    }

    #[test]
    fn test_error_display_unsupported_archive() {
        let err = InstallError::UnsupportedArchive {
            extension: ".rar".to_string(),
        };
        assert!(err.to_string().contains("'.rar'"));
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = InstallError::io("/opt/vaultbot")(std::io::Error::from(
            std::io::ErrorKind::PermissionDenied,
        ));
        assert!(err.to_string().starts_with("File I/O error at /opt/vaultbot"));
    }
}
