//! Bundle model.
//!
//! A bundle is one named, independently scheduled renewal configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::settings::AgentSettings;

/// Desired state of a managed resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The resource should exist and be active.
    #[default]
    Present,
    /// The resource should be removed.
    Absent,
}

impl Ensure {
    /// Returns true for [`Ensure::Present`].
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// Bundle settings as they appear in a manifest.
///
/// Keys that are neither `ensure` nor an agent setting are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(try_from = "RawBundleDefinition")]
pub struct BundleDefinition {
    /// Desired state of the bundle.
    pub ensure: Ensure,

    /// Agent settings specific to this bundle.
    pub settings: AgentSettings,
}

#[derive(Deserialize)]
struct RawBundleDefinition {
    #[serde(default)]
    ensure: Ensure,
    #[serde(flatten)]
    settings: AgentSettings,
    // Whatever the flattened settings did not claim.
    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl TryFrom<RawBundleDefinition> for BundleDefinition {
    type Error = String;

    fn try_from(raw: RawBundleDefinition) -> std::result::Result<Self, Self::Error> {
        if !raw.unknown.is_empty() {
            let keys: Vec<_> = raw.unknown.keys().map(|key| format!("`{key}`")).collect();
            return Err(format!("unknown bundle parameter(s) {}", keys.join(", ")));
        }
        Ok(Self {
            ensure: raw.ensure,
            settings: raw.settings,
        })
    }
}

/// The full parameter set for one named bundle.
///
/// # Examples
///
/// ```rust
/// use vaultbot_core::{AgentSettings, BundleSpec, Ensure};
///
/// let bundle = BundleSpec::new("web", Ensure::Present, AgentSettings::default()).unwrap();
/// assert_eq!(bundle.name(), "web");
/// ```
#[derive(Debug)]
pub struct BundleSpec {
    name: String,
    ensure: Ensure,
    settings: AgentSettings,
}

impl BundleSpec {
    /// Creates a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBundleName`] if the name cannot be used as
    /// part of a file name and a systemd instance name.
    pub fn new(name: impl Into<String>, ensure: Ensure, settings: AgentSettings) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self {
            name,
            ensure,
            settings,
        })
    }

    /// Creates a bundle from its manifest definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn from_definition(name: impl Into<String>, definition: BundleDefinition) -> Result<Self> {
        Self::new(name, definition.ensure, definition.settings)
    }

    /// Returns the bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the desired state.
    #[must_use]
    pub const fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Returns the bundle-specific settings.
    #[must_use]
    pub const fn settings(&self) -> &AgentSettings {
        &self.settings
    }
}

fn check_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name must not be empty"
    } else if name.starts_with('.') {
        "name must not start with '.'"
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        "only ASCII letters, digits, '_', '-' and '.' are allowed"
    } else {
        return Ok(());
    };

    Err(CoreError::InvalidBundleName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
