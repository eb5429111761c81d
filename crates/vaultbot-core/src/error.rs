//! Error types for vaultbot core operations.
//!
//! This module defines the error types used throughout the `vaultbot-core` crate.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using [`CoreError`] as the error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while validating or rendering a bundle.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A mandatory parameter was not provided.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An authentication method outside the supported set was requested.
    #[error("Unknown vault auth method '{value}' (expected one of: token, approle, aws-iam, aws-ec2, gcp-iam, gcp-gce, cert)")]
    UnknownAuthMethod {
        /// The rejected value.
        value: String,
    },

    /// A sensitive value could not be resolved to plaintext.
    #[error("Failed to resolve secret from {origin}: {reason}")]
    SecretResolution {
        /// Where the secret was supposed to come from (never the secret itself).
        origin: String,
        /// Reason the lookup failed.
        reason: String,
    },

    /// The bundle name cannot be used for file and unit names.
    #[error("Invalid bundle name '{name}': {reason}")]
    InvalidBundleName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}
