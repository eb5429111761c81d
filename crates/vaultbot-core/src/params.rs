//! Agent parameter names.
//!
//! Every setting the agent understands is a variant of [`Param`]. The
//! canonical name is the lower snake case form used in manifests; the
//! environment key written to config files is its upper-cased form.

use std::fmt;

/// A single agent setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// Log file of the agent.
    Logfile,
    /// Command executed after a renewal.
    RenewHook,
    /// Skip interactive confirmation prompts.
    AutoConfirm,

    /// Address of the Vault server.
    VaultAddr,
    /// CA certificate used to verify Vault.
    VaultCacert,
    /// Directory of CA certificates used to verify Vault.
    VaultCapath,
    /// Client certificate for TLS (and `cert` auth).
    VaultClientCert,
    /// Client key for TLS (and `cert` auth).
    VaultClientKey,
    /// Client timeout in seconds.
    VaultClientTimeout,
    /// Disable TLS verification.
    VaultSkipVerify,
    /// SNI name used when connecting to Vault.
    VaultTlsServerName,
    /// Maximum request retries.
    VaultMaxRetries,
    /// Token for `token` auth.
    VaultToken,
    /// Renew the token before use.
    VaultRenewToken,
    /// Selected auth method.
    VaultAuthMethod,
    /// Role for `cert` auth.
    VaultCertificateRole,
    /// Role for AWS auth.
    VaultAwsAuthRole,
    /// Mount of the AWS auth backend.
    VaultAwsAuthMount,
    /// `X-Vault-AWS-IAM-Server-ID` header value.
    VaultAwsAuthHeader,
    /// Nonce for `aws-ec2` auth.
    VaultAwsAuthNonce,
    /// File holding the `aws-ec2` nonce.
    VaultAwsAuthNoncePath,
    /// Role for GCP auth.
    VaultGcpAuthRole,
    /// Service account used for `gcp-iam` auth.
    VaultGcpAuthServiceAccountEmail,
    /// Mount of the GCP auth backend.
    VaultGcpAuthMount,
    /// Mount of the AppRole auth backend.
    VaultAppRoleMount,
    /// AppRole role id.
    VaultAppRoleRoleId,
    /// AppRole secret id.
    VaultAppRoleSecretId,

    /// Mount of the PKI secrets engine.
    PkiMount,
    /// PKI role used for issuance.
    PkiRoleName,
    /// Certificate common name.
    PkiCommonName,
    /// Subject alternative names.
    PkiAltNames,
    /// IP subject alternative names.
    PkiIpSans,
    /// Requested certificate TTL.
    PkiTtl,
    /// Leave the common name out of the SANs.
    PkiExcludeCnFromSans,
    /// Private key encoding (`der`, `pkcs8`).
    PkiPrivateKeyFormat,
    /// Fraction of the lifetime after which to renew.
    PkiRenewPercent,
    /// Absolute remaining lifetime after which to renew.
    PkiRenewTime,
    /// Renew regardless of remaining lifetime.
    PkiForceRenew,

    /// PEM certificate output.
    PkiCertPath,
    /// PEM CA chain output.
    PkiCachainPath,
    /// PEM private key output.
    PkiPrivkeyPath,
    /// Combined PEM bundle output.
    PkiPembundlePath,
    /// Java keystore output.
    PkiJksPath,
    /// Java keystore password.
    PkiJksPassword,
    /// Keystore alias of the certificate.
    PkiJksCertAlias,
    /// Keystore alias of the CA chain.
    PkiJksCachainAlias,
    /// Keystore alias of the private key.
    PkiJksPrivkeyAlias,
    /// PKCS#12 store output.
    PkiPkcs12Path,
    /// Umask applied to the PKCS#12 store.
    PkiPkcs12Umask,
    /// PKCS#12 store password.
    PkiPkcs12Password,
}

impl Param {
    /// Every parameter, in declaration order.
    pub const ALL: [Self; 50] = [
        Self::Logfile,
        Self::RenewHook,
        Self::AutoConfirm,
        Self::VaultAddr,
        Self::VaultCacert,
        Self::VaultCapath,
        Self::VaultClientCert,
        Self::VaultClientKey,
        Self::VaultClientTimeout,
        Self::VaultSkipVerify,
        Self::VaultTlsServerName,
        Self::VaultMaxRetries,
        Self::VaultToken,
        Self::VaultRenewToken,
        Self::VaultAuthMethod,
        Self::VaultCertificateRole,
        Self::VaultAwsAuthRole,
        Self::VaultAwsAuthMount,
        Self::VaultAwsAuthHeader,
        Self::VaultAwsAuthNonce,
        Self::VaultAwsAuthNoncePath,
        Self::VaultGcpAuthRole,
        Self::VaultGcpAuthServiceAccountEmail,
        Self::VaultGcpAuthMount,
        Self::VaultAppRoleMount,
        Self::VaultAppRoleRoleId,
        Self::VaultAppRoleSecretId,
        Self::PkiMount,
        Self::PkiRoleName,
        Self::PkiCommonName,
        Self::PkiAltNames,
        Self::PkiIpSans,
        Self::PkiTtl,
        Self::PkiExcludeCnFromSans,
        Self::PkiPrivateKeyFormat,
        Self::PkiRenewPercent,
        Self::PkiRenewTime,
        Self::PkiForceRenew,
        Self::PkiCertPath,
        Self::PkiCachainPath,
        Self::PkiPrivkeyPath,
        Self::PkiPembundlePath,
        Self::PkiJksPath,
        Self::PkiJksPassword,
        Self::PkiJksCertAlias,
        Self::PkiJksCachainAlias,
        Self::PkiJksPrivkeyAlias,
        Self::PkiPkcs12Path,
        Self::PkiPkcs12Umask,
        Self::PkiPkcs12Password,
    ];

    /// Returns the canonical (manifest) name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Logfile => "logfile",
            Self::RenewHook => "renew_hook",
            Self::AutoConfirm => "auto_confirm",
            Self::VaultAddr => "vault_addr",
            Self::VaultCacert => "vault_cacert",
            Self::VaultCapath => "vault_capath",
            Self::VaultClientCert => "vault_client_cert",
            Self::VaultClientKey => "vault_client_key",
            Self::VaultClientTimeout => "vault_client_timeout",
            Self::VaultSkipVerify => "vault_skip_verify",
            Self::VaultTlsServerName => "vault_tls_server_name",
            Self::VaultMaxRetries => "vault_max_retries",
            Self::VaultToken => "vault_token",
            Self::VaultRenewToken => "vault_renew_token",
            Self::VaultAuthMethod => "vault_auth_method",
            Self::VaultCertificateRole => "vault_certificate_role",
            Self::VaultAwsAuthRole => "vault_aws_auth_role",
            Self::VaultAwsAuthMount => "vault_aws_auth_mount",
            Self::VaultAwsAuthHeader => "vault_aws_auth_header",
            Self::VaultAwsAuthNonce => "vault_aws_auth_nonce",
            Self::VaultAwsAuthNoncePath => "vault_aws_auth_nonce_path",
            Self::VaultGcpAuthRole => "vault_gcp_auth_role",
            Self::VaultGcpAuthServiceAccountEmail => "vault_gcp_auth_service_account_email",
            Self::VaultGcpAuthMount => "vault_gcp_auth_mount",
            Self::VaultAppRoleMount => "vault_app_role_mount",
            Self::VaultAppRoleRoleId => "vault_app_role_role_id",
            Self::VaultAppRoleSecretId => "vault_app_role_secret_id",
            Self::PkiMount => "pki_mount",
            Self::PkiRoleName => "pki_role_name",
            Self::PkiCommonName => "pki_common_name",
            Self::PkiAltNames => "pki_alt_names",
            Self::PkiIpSans => "pki_ip_sans",
            Self::PkiTtl => "pki_ttl",
            Self::PkiExcludeCnFromSans => "pki_exclude_cn_from_sans",
            Self::PkiPrivateKeyFormat => "pki_private_key_format",
            Self::PkiRenewPercent => "pki_renew_percent",
            Self::PkiRenewTime => "pki_renew_time",
            Self::PkiForceRenew => "pki_force_renew",
            Self::PkiCertPath => "pki_cert_path",
            Self::PkiCachainPath => "pki_cachain_path",
            Self::PkiPrivkeyPath => "pki_privkey_path",
            Self::PkiPembundlePath => "pki_pembundle_path",
            Self::PkiJksPath => "pki_jks_path",
            Self::PkiJksPassword => "pki_jks_password",
            Self::PkiJksCertAlias => "pki_jks_cert_alias",
            Self::PkiJksCachainAlias => "pki_jks_cachain_alias",
            Self::PkiJksPrivkeyAlias => "pki_jks_privkey_alias",
            Self::PkiPkcs12Path => "pki_pkcs12_path",
            Self::PkiPkcs12Umask => "pki_pkcs12_umask",
            Self::PkiPkcs12Password => "pki_pkcs12_password",
        }
    }

    /// Returns the environment variable name the agent reads.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultbot_core::Param;
    ///
    /// assert_eq!(Param::PkiCommonName.env_key(), "PKI_COMMON_NAME");
    /// ```
    #[must_use]
    pub fn env_key(self) -> String {
        self.name().to_ascii_uppercase()
    }

    /// Looks a parameter up by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Returns true if the value is sensitive and must be resolved at render time.
    #[must_use]
    pub const fn is_sensitive(self) -> bool {
        matches!(
            self,
            Self::VaultToken
                | Self::VaultAppRoleSecretId
                | Self::PkiJksPassword
                | Self::PkiPkcs12Password
        )
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = Param::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), Param::ALL.len());
    }

    #[test]
    fn test_names_are_lower_snake_case() {
        for param in Param::ALL {
            assert!(
                param
                    .name()
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{param} is not lower snake case"
            );
        }
    }

    #[test]
    fn test_from_name_roundtrip() {
        for param in Param::ALL {
            assert_eq!(Param::from_name(param.name()), Some(param));
        }
        assert_eq!(Param::from_name("vault_nonexistent"), None);
    }

    #[test]
    fn test_env_key() {
        assert_eq!(Param::VaultAddr.env_key(), "VAULT_ADDR");
        assert_eq!(Param::PkiPkcs12Umask.env_key(), "PKI_PKCS12_UMASK");
    }

    #[test]
    fn test_sensitive_params() {
        assert!(Param::PkiJksPassword.is_sensitive());
        assert!(Param::PkiPkcs12Password.is_sensitive());
        assert!(!Param::PkiJksPath.is_sensitive());
    }
}
