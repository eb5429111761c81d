//! Sensitive parameter values.
//!
//! A [`Sensitive`] value is either held inline (wrapped in a
//! [`SecretString`]) or refers to an environment variable or file holding
//! the secret. Plaintext is only produced by [`Sensitive::reveal`], which the
//! renderer calls while writing the config line.

use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, Result};

/// A secret-typed parameter value.
pub enum Sensitive {
    /// Secret given directly in the manifest.
    Inline(SecretString),
    /// Secret read from an environment variable at render time.
    Env(String),
    /// Secret read from a file at render time.
    File(PathBuf),
}

impl Sensitive {
    /// Wraps an inline secret.
    #[must_use]
    pub fn inline(value: impl Into<String>) -> Self {
        Self::Inline(SecretString::from(value.into()))
    }

    /// Refers to an environment variable.
    #[must_use]
    pub fn from_env(var: impl Into<String>) -> Self {
        Self::Env(var.into())
    }

    /// Refers to a file.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Returns true if this is an inline secret with no content.
    ///
    /// References are never empty here; they are checked when revealed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inline(secret) => secret.expose_secret().is_empty(),
            Self::Env(_) | Self::File(_) => false,
        }
    }

    /// Describes where the secret comes from without exposing it.
    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Self::Inline(_) => "inline value".to_string(),
            Self::Env(var) => format!("environment variable {var}"),
            Self::File(path) => format!("file {}", path.display()),
        }
    }

    /// Resolves the secret to its plaintext form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SecretResolution`] if the referenced variable is
    /// unset, the file cannot be read, or the reference resolves to an empty
    /// value.
    pub fn reveal(&self) -> Result<SecretString> {
        let resolved = match self {
            Self::Inline(secret) => {
                return Ok(SecretString::from(secret.expose_secret().to_owned()));
            }
            Self::Env(var) => std::env::var(var).map_err(|e| self.resolution_error(e))?,
            Self::File(path) => {
                let mut contents =
                    std::fs::read_to_string(path).map_err(|e| self.resolution_error(e))?;
                let trimmed = contents.trim_end_matches(['\r', '\n']).len();
                contents.truncate(trimmed);
                contents
            }
        };

        if resolved.is_empty() {
            return Err(self.resolution_error("resolved to an empty value"));
        }

        Ok(SecretString::from(resolved))
    }

    fn resolution_error(&self, reason: impl fmt::Display) -> CoreError {
        CoreError::SecretResolution {
            origin: self.origin(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Sensitive([REDACTED])"),
            Self::Env(var) => write!(f, "Sensitive(env:{var})"),
            Self::File(path) => write!(f, "Sensitive(file:{})", path.display()),
        }
    }
}

/// Accepted manifest shapes for a sensitive value.
#[derive(Deserialize)]
#[serde(untagged)]
enum SensitiveRepr {
    Plain(String),
    Env { env: String },
    File { file: PathBuf },
}

impl<'de> Deserialize<'de> for Sensitive {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match SensitiveRepr::deserialize(deserializer)? {
            SensitiveRepr::Plain(value) => Self::inline(value),
            SensitiveRepr::Env { env } => Self::Env(env),
            SensitiveRepr::File { file } => Self::File(file),
        })
    }
}
