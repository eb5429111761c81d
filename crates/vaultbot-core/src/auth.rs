//! Vault authentication methods and the parameters each one requires.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CoreError;
use crate::params::Param;

/// Mechanism the agent uses to authenticate against Vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum AuthMethod {
    /// Static Vault token.
    #[default]
    Token,
    /// AppRole role id + secret id.
    AppRole,
    /// AWS IAM principal.
    AwsIam,
    /// AWS EC2 instance identity.
    AwsEc2,
    /// GCP IAM service account.
    GcpIam,
    /// GCP GCE instance identity.
    GcpGce,
    /// TLS client certificate.
    Cert,
}

impl AuthMethod {
    /// Every supported method.
    pub const ALL: [Self; 7] = [
        Self::Token,
        Self::AppRole,
        Self::AwsIam,
        Self::AwsEc2,
        Self::GcpIam,
        Self::GcpGce,
        Self::Cert,
    ];

    /// Returns the value written to `VAULT_AUTH_METHOD`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::AppRole => "approle",
            Self::AwsIam => "aws-iam",
            Self::AwsEc2 => "aws-ec2",
            Self::GcpIam => "gcp-iam",
            Self::GcpGce => "gcp-gce",
            Self::Cert => "cert",
        }
    }

    /// Returns the parameters that must be non-empty when this method is selected.
    ///
    /// The slice order is the order in which the validator checks them.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultbot_core::{AuthMethod, Param};
    ///
    /// assert_eq!(
    ///     AuthMethod::AppRole.required_params(),
    ///     &[Param::VaultAppRoleRoleId, Param::VaultAppRoleSecretId]
    /// );
    /// ```
    #[must_use]
    pub const fn required_params(self) -> &'static [Param] {
        match self {
            Self::Token => &[Param::VaultToken],
            Self::AppRole => &[Param::VaultAppRoleRoleId, Param::VaultAppRoleSecretId],
            Self::AwsIam | Self::AwsEc2 => &[Param::VaultAwsAuthRole],
            Self::GcpIam | Self::GcpGce => &[Param::VaultGcpAuthRole],
            Self::Cert => &[Param::VaultClientCert, Param::VaultClientKey],
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAuthMethod {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for AuthMethod {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
