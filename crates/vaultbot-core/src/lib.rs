//! # Vaultbot Core
//!
//! Bundle definition engine for vaultbot deployments.
//!
//! A *bundle* is one named certificate-renewal configuration run by the
//! agent on a timer. This crate provides:
//!
//! - [`AgentSettings`] - typed agent parameters, keyed by [`Param`]
//! - [`AuthMethod`] - the Vault auth methods and the parameters each one requires
//! - [`validate`] - ordered, first-failure-wins bundle validation
//! - [`render`] / [`render_bundle`] - deterministic `KEY='value'` config rendering
//! - [`Sensitive`] - secret values that are only revealed while rendering
//!
//! ## Example
//!
//! ```rust
//! use vaultbot_core::{render_bundle, validate, AgentSettings, BundleSpec, Ensure, Sensitive};
//!
//! let settings = AgentSettings {
//!     vault_addr: Some("https://vault.example.com".to_string()),
//!     vault_token: Some(Sensitive::inline("s.token")),
//!     pki_mount: Some("pki".to_string()),
//!     pki_role_name: Some("web".to_string()),
//!     pki_common_name: Some("www.example.com".to_string()),
//!     pki_cert_path: Some("/etc/ssl/www.pem".to_string()),
//!     ..Default::default()
//! };
//! let bundle = BundleSpec::new("www", Ensure::Present, settings).unwrap();
//!
//! let validated = validate(&bundle, &AgentSettings::default()).unwrap();
//! let rendered = render_bundle(&validated).unwrap();
//! assert!(rendered.as_str().starts_with("PKI_CERT_PATH='/etc/ssl/www.pem'\n"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod bundle;
pub mod error;
pub mod output;
pub mod params;
pub mod render;
pub mod secret;
pub mod settings;
pub mod validation;


pub use auth::AuthMethod;
pub use bundle::{BundleDefinition, BundleSpec, Ensure};
pub use error::{CoreError, Result};
pub use output::{has_any_output, OUTPUT_PATHS, PRIMARY_OUTPUT};
pub use params::Param;
pub use render::{render, render_bundle, RenderedConfig};
pub use secret::Sensitive;
pub use settings::{AgentSettings, ParamValue, ProvidedParams};
pub use validation::{
    validate, LayeredSettings, ValidatedBundle, ValidationError, ValidationErrorKind,
};
