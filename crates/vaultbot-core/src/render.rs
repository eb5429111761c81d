//! Config file rendering.
//!
//! Settings are rendered as one `UPPER_NAME='value'` line per set
//! parameter, sorted by canonical name and terminated by a newline. A file
//! with nothing set consists of a single newline. Values are not escaped,
//! so callers must not pass values containing `'`.

use std::fmt;

use secrecy::zeroize::Zeroize;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::bundle::Ensure;
use crate::error::Result;
use crate::params::Param;
use crate::settings::{AgentSettings, ParamValue};
use crate::validation::ValidatedBundle;

/// Rendered content of an agent environment file.
///
/// The content may hold revealed secrets: it is redacted in `Debug` output
/// and wiped when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    content: String,
}

impl RenderedConfig {
    /// The content of a config file with no settings.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            content: "\n".to_string(),
        }
    }

    /// Returns the file content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Returns the file content as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Returns the number of `KEY='value'` lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().filter(|line| !line.is_empty()).count()
    }
}

impl fmt::Debug for RenderedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedConfig")
            .field("lines", &self.line_count())
            .field("bytes", &self.content.len())
            .finish()
    }
}

impl Drop for RenderedConfig {
    fn drop(&mut self) {
        self.content.zeroize();
    }
}

/// Renders settings into environment file content.
///
/// # Errors
///
/// Returns [`CoreError::SecretResolution`](crate::CoreError::SecretResolution)
/// if a sensitive value cannot be revealed.
///
/// # Examples
///
/// ```
/// use vaultbot_core::{render, AgentSettings};
///
/// let settings = AgentSettings {
///     vault_addr: Some("https://vault.example.com".to_string()),
///     pki_alt_names: Some(vec!["a.example.com".to_string(), "b.example.com".to_string()]),
///     ..Default::default()
/// };
/// let rendered = render(&settings).unwrap();
/// assert_eq!(
///     rendered.as_str(),
///     "PKI_ALT_NAMES='a.example.com,b.example.com'\nVAULT_ADDR='https://vault.example.com'\n"
/// );
/// ```
pub fn render(settings: &AgentSettings) -> Result<RenderedConfig> {
    let mut entries: Vec<(Param, ParamValue<'_>)> = settings.iter_set().collect();
    if entries.is_empty() {
        return Ok(RenderedConfig::empty());
    }
    entries.sort_by_key(|(param, _)| param.name());

    let mut rendered = RenderedConfig {
        content: String::new(),
    };
    for (param, value) in entries {
        rendered.content.push_str(&param.env_key());
        rendered.content.push_str("='");
        push_value(&mut rendered.content, value)?;
        rendered.content.push_str("'\n");
    }

    Ok(rendered)
}

/// Renders a validated bundle.
///
/// Only the bundle's own settings are written; shared defaults live in the
/// global file. An absent bundle renders as an empty file.
///
/// # Errors
///
/// Returns an error if a sensitive value cannot be revealed.
pub fn render_bundle(validated: &ValidatedBundle<'_>) -> Result<RenderedConfig> {
    let bundle = validated.bundle();
    if bundle.ensure() == Ensure::Absent {
        return Ok(RenderedConfig::empty());
    }

    let rendered = render(bundle.settings())?;
    debug!(
        bundle = %bundle.name(),
        lines = rendered.line_count(),
        "Rendered bundle config"
    );
    Ok(rendered)
}

fn push_value(out: &mut String, value: ParamValue<'_>) -> Result<()> {
    match value {
        ParamValue::Text(text) => out.push_str(text),
        ParamValue::Flag(flag) => out.push_str(if flag { "true" } else { "false" }),
        ParamValue::Integer(number) => out.push_str(&number.to_string()),
        ParamValue::Decimal(number) => out.push_str(&number.to_string()),
        ParamValue::List(items) => out.push_str(&items.join(",")),
        ParamValue::Auth(method) => out.push_str(method.as_str()),
        ParamValue::Secret(secret) => out.push_str(secret.reveal()?.expose_secret()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMethod;
    use crate::bundle::BundleSpec;
    use crate::secret::Sensitive;
    use crate::validation::validate;
    use crate::CoreError;

    fn basic_settings() -> AgentSettings {
        AgentSettings {
            vault_addr: Some("https://vault.example.com".to_string()),
            vault_auth_method: Some(AuthMethod::Token),
            vault_token: Some(Sensitive::inline("test-vault-token")),
            pki_mount: Some("test-pki".to_string()),
            pki_role_name: Some("test-pki-role".to_string()),
            pki_common_name: Some("test-pki-cn.example.com".to_string()),
            pki_cert_path: Some("/etc/ssl/test-cert.pem".to_string()),
            pki_privkey_path: Some("/etc/ssl/test-pkey.pem".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_settings_render_single_newline() {
        let rendered = render(&AgentSettings::default()).unwrap();
        assert_eq!(rendered.as_str(), "\n");
        assert_eq!(rendered.line_count(), 0);
    }

    #[test]
    fn test_basic_bundle() {
        let rendered = render(&basic_settings()).unwrap();
        let expected = "\
PKI_CERT_PATH='/etc/ssl/test-cert.pem'
PKI_COMMON_NAME='test-pki-cn.example.com'
PKI_MOUNT='test-pki'
PKI_PRIVKEY_PATH='/etc/ssl/test-pkey.pem'
PKI_ROLE_NAME='test-pki-role'
VAULT_ADDR='https://vault.example.com'
VAULT_AUTH_METHOD='token'
VAULT_TOKEN='test-vault-token'
";
        assert_eq!(rendered.as_str(), expected);
        assert_eq!(rendered.line_count(), 8);
    }

    #[test]
    fn test_scalar_formatting() {
        let settings = AgentSettings {
            auto_confirm: Some(true),
            pki_force_renew: Some(false),
            vault_client_timeout: Some(123),
            pki_renew_percent: Some(0.85),
            pki_ip_sans: Some(vec!["1.2.3.4".to_string(), "2.3.4.5".to_string()]),
            vault_auth_method: Some(AuthMethod::AwsIam),
            ..Default::default()
        };
        let rendered = render(&settings).unwrap();
        assert_eq!(
            rendered.as_str(),
            "AUTO_CONFIRM='true'\nPKI_FORCE_RENEW='false'\nPKI_IP_SANS='1.2.3.4,2.3.4.5'\n\
             PKI_RENEW_PERCENT='0.85'\nVAULT_AUTH_METHOD='aws-iam'\nVAULT_CLIENT_TIMEOUT='123'\n"
        );
    }

    #[test]
    fn test_lists_render_as_single_key() {
        let settings = AgentSettings {
            pki_alt_names: Some(vec![
                "test-a.example.com".to_string(),
                "test-b.example.com".to_string(),
            ]),
            ..Default::default()
        };
        let rendered = render(&settings).unwrap();
        assert_eq!(rendered.as_str().matches("PKI_ALT_NAMES=").count(), 1);
        assert!(rendered
            .as_str()
            .contains("PKI_ALT_NAMES='test-a.example.com,test-b.example.com'"));
    }

    #[test]
    fn test_secrets_render_as_plaintext() {
        let settings = AgentSettings {
            pki_jks_password: Some(Sensitive::inline("kenneth123")),
            pki_pkcs12_password: Some(Sensitive::inline("kenneth1234")),
            ..Default::default()
        };
        let rendered = render(&settings).unwrap();
        assert_eq!(
            rendered.as_str(),
            "PKI_JKS_PASSWORD='kenneth123'\nPKI_PKCS12_PASSWORD='kenneth1234'\n"
        );
        assert!(!rendered.as_str().contains("REDACTED"));
    }

    #[test]
    fn test_unresolvable_secret_fails_render() {
        let settings = AgentSettings {
            pki_jks_password: Some(Sensitive::from_env("VAULTBOT_RENDER_TEST_UNSET")),
            ..basic_settings()
        };
        let err = render(&settings).unwrap_err();
        assert!(matches!(err, CoreError::SecretResolution { .. }));
    }

    #[test]
    fn test_debug_does_not_leak_content() {
        let rendered = render(&basic_settings()).unwrap();
        let debug = format!("{rendered:?}");
        assert!(!debug.contains("test-vault-token"));
        assert!(debug.contains("lines: 8"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let settings = basic_settings();
        assert_eq!(render(&settings).unwrap(), render(&settings).unwrap());
    }

    #[test]
    fn test_render_absent_bundle() {
        let bundle = BundleSpec::new("gone", Ensure::Absent, basic_settings()).unwrap();
        let validated = validate(&bundle, &AgentSettings::default()).unwrap();
        assert_eq!(render_bundle(&validated).unwrap().as_str(), "\n");
    }

    #[test]
    fn test_render_bundle_uses_only_bundle_settings() {
        let defaults = basic_settings();
        let bundle = BundleSpec::new(
            "web",
            Ensure::Present,
            AgentSettings {
                pki_common_name: Some("web.example.com".to_string()),
                pki_cert_path: Some("/etc/ssl/web.pem".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let validated = validate(&bundle, &defaults).unwrap();
        assert_eq!(
            render_bundle(&validated).unwrap().as_str(),
            "PKI_CERT_PATH='/etc/ssl/web.pem'\nPKI_COMMON_NAME='web.example.com'\n"
        );
    }
}
