//! Bundle validation.
//!
//! Validation runs as one ordered pipeline and stops at the first missing
//! parameter, so a given malformed bundle always produces the same error:
//!
//! 1. `vault_addr`, `pki_mount`, `pki_role_name`, `pki_common_name`
//! 2. at least one output path (reported as `pki_cert_path`)
//! 3. the parameters required by the effective auth method
//!
//! A parameter the bundle sets is judged by the bundle's value alone, since
//! the bundle file overrides the global file. A parameter the bundle leaves
//! unset counts as provided when it is non-empty on the global defaults.

use std::fmt;

use tracing::debug;

use crate::auth::AuthMethod;
use crate::bundle::{BundleSpec, Ensure};
use crate::output::{has_any_output, PRIMARY_OUTPUT};
use crate::params::Param;
use crate::settings::{AgentSettings, ProvidedParams};

/// Parameters every present bundle needs, in check order.
pub const ALWAYS_REQUIRED: [Param; 4] = [
    Param::VaultAddr,
    Param::PkiMount,
    Param::PkiRoleName,
    Param::PkiCommonName,
];

/// A bundle failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The parameter that is missing.
    pub param: Param,
    /// A human-readable description of the failure.
    pub message: String,
    /// The kind of validation that failed.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Creates a validation error for a required parameter that is missing.
    #[must_use]
    pub fn required(param: Param) -> Self {
        Self {
            message: format!("${param} is required"),
            param,
            kind: ValidationErrorKind::Required,
        }
    }

    /// Creates a validation error for a bundle without any output path.
    #[must_use]
    pub fn output_required() -> Self {
        Self {
            message: format!("${PRIMARY_OUTPUT} or another output path is required"),
            param: PRIMARY_OUTPUT,
            kind: ValidationErrorKind::OutputRequired,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The category of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A required parameter was not provided.
    Required,
    /// None of the output paths was provided.
    OutputRequired,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::OutputRequired => write!(f, "output_required"),
        }
    }
}

/// Bundle settings layered over the global defaults.
#[derive(Debug, Clone, Copy)]
pub struct LayeredSettings<'a> {
    bundle: &'a AgentSettings,
    defaults: &'a AgentSettings,
}

impl<'a> LayeredSettings<'a> {
    /// Layers `bundle` over `defaults`.
    #[must_use]
    pub const fn new(bundle: &'a AgentSettings, defaults: &'a AgentSettings) -> Self {
        Self { bundle, defaults }
    }

    /// Returns the auth method the agent will use for this bundle.
    #[must_use]
    pub fn auth_method(&self) -> AuthMethod {
        self.bundle
            .vault_auth_method
            .or(self.defaults.vault_auth_method)
            .unwrap_or_default()
    }
}

impl ProvidedParams for LayeredSettings<'_> {
    fn is_provided(&self, param: Param) -> bool {
        if self.bundle.get(param).is_some() {
            self.bundle.is_provided(param)
        } else {
            self.defaults.is_provided(param)
        }
    }
}

/// A bundle that passed validation (or is absent and needs none).
///
/// Only a validated bundle can be rendered with
/// [`render_bundle`](crate::render::render_bundle).
#[derive(Debug, Clone, Copy)]
pub struct ValidatedBundle<'a> {
    bundle: &'a BundleSpec,
    auth_method: AuthMethod,
}

impl<'a> ValidatedBundle<'a> {
    /// Returns the underlying bundle.
    #[must_use]
    pub const fn bundle(&self) -> &'a BundleSpec {
        self.bundle
    }

    /// Returns the effective auth method.
    #[must_use]
    pub const fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }
}

/// Validates a bundle against the global defaults.
///
/// Absent bundles are accepted without any check.
///
/// # Errors
///
/// Returns the first missing parameter in pipeline order.
///
/// # Examples
///
/// ```
/// use vaultbot_core::{validate, AgentSettings, BundleSpec, Ensure, Param};
///
/// let bundle = BundleSpec::new("web", Ensure::Present, AgentSettings::default()).unwrap();
/// let err = validate(&bundle, &AgentSettings::default()).unwrap_err();
/// assert_eq!(err.param, Param::VaultAddr);
/// ```
pub fn validate<'a>(
    bundle: &'a BundleSpec,
    defaults: &AgentSettings,
) -> Result<ValidatedBundle<'a>, ValidationError> {
    let layered = LayeredSettings::new(bundle.settings(), defaults);
    let auth_method = layered.auth_method();
    let validated = ValidatedBundle {
        bundle,
        auth_method,
    };

    if bundle.ensure() == Ensure::Absent {
        debug!(bundle = %bundle.name(), "Skipping validation of absent bundle");
        return Ok(validated);
    }

    for param in ALWAYS_REQUIRED {
        require(&layered, param)?;
    }

    if !has_any_output(&layered) {
        return Err(ValidationError::output_required());
    }

    for param in auth_method.required_params() {
        require(&layered, *param)?;
    }

    debug!(bundle = %bundle.name(), auth_method = %auth_method, "Bundle validated");
    Ok(validated)
}

fn require(settings: &LayeredSettings<'_>, param: Param) -> Result<(), ValidationError> {
    if settings.is_provided(param) {
        Ok(())
    } else {
        Err(ValidationError::required(param))
    }
}
