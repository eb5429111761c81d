//! Typed agent settings.
//!
//! [`AgentSettings`] carries one optional value per [`Param`]. It is used
//! both for the global defaults and for each bundle; a field left unset is
//! simply not written to the rendered file.

use serde::Deserialize;

use crate::auth::AuthMethod;
use crate::params::Param;
use crate::secret::Sensitive;

/// Borrowed view of one parameter value.
#[derive(Debug, Clone, Copy)]
pub enum ParamValue<'a> {
    /// Free-form string.
    Text(&'a str),
    /// Boolean flag.
    Flag(bool),
    /// Non-negative integer.
    Integer(u64),
    /// Decimal number.
    Decimal(f64),
    /// List rendered comma-joined.
    List(&'a [String]),
    /// Authentication method.
    Auth(AuthMethod),
    /// Secret resolved at render time.
    Secret(&'a Sensitive),
}

impl ParamValue<'_> {
    /// Returns true if the value carries no content.
    ///
    /// Flags and numbers are never empty; strings, lists and inline secrets
    /// are empty when they have no characters or items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(value) => value.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Secret(secret) => secret.is_empty(),
            Self::Flag(_) | Self::Integer(_) | Self::Decimal(_) | Self::Auth(_) => false,
        }
    }
}

/// Something that can answer whether a parameter was provided.
pub trait ProvidedParams {
    /// Returns true if `param` has a non-empty value.
    fn is_provided(&self, param: Param) -> bool;
}

/// Settings understood by the agent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(missing_docs)]
pub struct AgentSettings {
    pub logfile: Option<String>,
    pub renew_hook: Option<String>,
    pub auto_confirm: Option<bool>,

    pub vault_addr: Option<String>,
    pub vault_cacert: Option<String>,
    pub vault_capath: Option<String>,
    pub vault_client_cert: Option<String>,
    pub vault_client_key: Option<String>,
    pub vault_client_timeout: Option<u64>,
    pub vault_skip_verify: Option<bool>,
    pub vault_tls_server_name: Option<String>,
    pub vault_max_retries: Option<u64>,
    pub vault_token: Option<Sensitive>,
    pub vault_renew_token: Option<bool>,
    pub vault_auth_method: Option<AuthMethod>,
    pub vault_certificate_role: Option<String>,
    pub vault_aws_auth_role: Option<String>,
    pub vault_aws_auth_mount: Option<String>,
    pub vault_aws_auth_header: Option<String>,
    pub vault_aws_auth_nonce: Option<String>,
    pub vault_aws_auth_nonce_path: Option<String>,
    pub vault_gcp_auth_role: Option<String>,
    pub vault_gcp_auth_service_account_email: Option<String>,
    pub vault_gcp_auth_mount: Option<String>,
    pub vault_app_role_mount: Option<String>,
    pub vault_app_role_role_id: Option<String>,
    pub vault_app_role_secret_id: Option<Sensitive>,

    pub pki_mount: Option<String>,
    pub pki_role_name: Option<String>,
    pub pki_common_name: Option<String>,
    pub pki_alt_names: Option<Vec<String>>,
    pub pki_ip_sans: Option<Vec<String>>,
    pub pki_ttl: Option<String>,
    pub pki_exclude_cn_from_sans: Option<bool>,
    pub pki_private_key_format: Option<String>,
    pub pki_renew_percent: Option<f64>,
    pub pki_renew_time: Option<String>,
    pub pki_force_renew: Option<bool>,

    pub pki_cert_path: Option<String>,
    pub pki_cachain_path: Option<String>,
    pub pki_privkey_path: Option<String>,
    pub pki_pembundle_path: Option<String>,
    pub pki_jks_path: Option<String>,
    pub pki_jks_password: Option<Sensitive>,
    pub pki_jks_cert_alias: Option<String>,
    pub pki_jks_cachain_alias: Option<String>,
    pub pki_jks_privkey_alias: Option<String>,
    pub pki_pkcs12_path: Option<String>,
    pub pki_pkcs12_umask: Option<String>,
    pub pki_pkcs12_password: Option<Sensitive>,
}

fn text(value: &Option<String>) -> Option<ParamValue<'_>> {
    value.as_deref().map(ParamValue::Text)
}

fn secret(value: &Option<Sensitive>) -> Option<ParamValue<'_>> {
    value.as_ref().map(ParamValue::Secret)
}

fn list(value: &Option<Vec<String>>) -> Option<ParamValue<'_>> {
    value.as_deref().map(ParamValue::List)
}

impl AgentSettings {
    /// Returns the value of `param`, if set.
    #[must_use]
    pub fn get(&self, param: Param) -> Option<ParamValue<'_>> {
        match param {
            Param::Logfile => text(&self.logfile),
            Param::RenewHook => text(&self.renew_hook),
            Param::AutoConfirm => self.auto_confirm.map(ParamValue::Flag),
            Param::VaultAddr => text(&self.vault_addr),
            Param::VaultCacert => text(&self.vault_cacert),
            Param::VaultCapath => text(&self.vault_capath),
            Param::VaultClientCert => text(&self.vault_client_cert),
            Param::VaultClientKey => text(&self.vault_client_key),
            Param::VaultClientTimeout => self.vault_client_timeout.map(ParamValue::Integer),
            Param::VaultSkipVerify => self.vault_skip_verify.map(ParamValue::Flag),
            Param::VaultTlsServerName => text(&self.vault_tls_server_name),
            Param::VaultMaxRetries => self.vault_max_retries.map(ParamValue::Integer),
            Param::VaultToken => secret(&self.vault_token),
            Param::VaultRenewToken => self.vault_renew_token.map(ParamValue::Flag),
            Param::VaultAuthMethod => self.vault_auth_method.map(ParamValue::Auth),
            Param::VaultCertificateRole => text(&self.vault_certificate_role),
            Param::VaultAwsAuthRole => text(&self.vault_aws_auth_role),
            Param::VaultAwsAuthMount => text(&self.vault_aws_auth_mount),
            Param::VaultAwsAuthHeader => text(&self.vault_aws_auth_header),
            Param::VaultAwsAuthNonce => text(&self.vault_aws_auth_nonce),
            Param::VaultAwsAuthNoncePath => text(&self.vault_aws_auth_nonce_path),
            Param::VaultGcpAuthRole => text(&self.vault_gcp_auth_role),
            Param::VaultGcpAuthServiceAccountEmail => {
                text(&self.vault_gcp_auth_service_account_email)
            }
            Param::VaultGcpAuthMount => text(&self.vault_gcp_auth_mount),
            Param::VaultAppRoleMount => text(&self.vault_app_role_mount),
            Param::VaultAppRoleRoleId => text(&self.vault_app_role_role_id),
            Param::VaultAppRoleSecretId => secret(&self.vault_app_role_secret_id),
            Param::PkiMount => text(&self.pki_mount),
            Param::PkiRoleName => text(&self.pki_role_name),
            Param::PkiCommonName => text(&self.pki_common_name),
            Param::PkiAltNames => list(&self.pki_alt_names),
            Param::PkiIpSans => list(&self.pki_ip_sans),
            Param::PkiTtl => text(&self.pki_ttl),
            Param::PkiExcludeCnFromSans => self.pki_exclude_cn_from_sans.map(ParamValue::Flag),
            Param::PkiPrivateKeyFormat => text(&self.pki_private_key_format),
            Param::PkiRenewPercent => self.pki_renew_percent.map(ParamValue::Decimal),
            Param::PkiRenewTime => text(&self.pki_renew_time),
            Param::PkiForceRenew => self.pki_force_renew.map(ParamValue::Flag),
            Param::PkiCertPath => text(&self.pki_cert_path),
            Param::PkiCachainPath => text(&self.pki_cachain_path),
            Param::PkiPrivkeyPath => text(&self.pki_privkey_path),
            Param::PkiPembundlePath => text(&self.pki_pembundle_path),
            Param::PkiJksPath => text(&self.pki_jks_path),
            Param::PkiJksPassword => secret(&self.pki_jks_password),
            Param::PkiJksCertAlias => text(&self.pki_jks_cert_alias),
            Param::PkiJksCachainAlias => text(&self.pki_jks_cachain_alias),
            Param::PkiJksPrivkeyAlias => text(&self.pki_jks_privkey_alias),
            Param::PkiPkcs12Path => text(&self.pki_pkcs12_path),
            Param::PkiPkcs12Umask => text(&self.pki_pkcs12_umask),
            Param::PkiPkcs12Password => secret(&self.pki_pkcs12_password),
        }
    }

    /// Iterates over the parameters that are set, in declaration order.
    pub fn iter_set(&self) -> impl Iterator<Item = (Param, ParamValue<'_>)> + '_ {
        Param::ALL
            .into_iter()
            .filter_map(move |param| self.get(param).map(|value| (param, value)))
    }

    /// Returns true if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter_set().next().is_none()
    }
}

impl ProvidedParams for AgentSettings {
    fn is_provided(&self, param: Param) -> bool {
        self.get(param).is_some_and(|value| !value.is_empty())
    }
}
