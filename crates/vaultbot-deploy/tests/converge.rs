//! End-to-end convergence against a staging root.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use vaultbot_deploy::{ConvergenceReport, Deployment, FsConfigStore, Layout, Manifest};
use vaultbot_installer::{Arch, ArtifactFetcher, ArtifactRequest, InstallError};
use vaultbot_systemd::{RecordingUnitManager, UnitCall, UnitState};

/// Pretends to download by writing a stub binary.
struct StubFetcher;

#[async_trait]
impl ArtifactFetcher for StubFetcher {
    async fn ensure_installed(&self, request: &ArtifactRequest) -> Result<PathBuf, InstallError> {
        if !request.creates.exists() {
            fs::write(&request.creates, b"#!/bin/sh\n").unwrap();
        }
        Ok(request.creates.clone())
    }
}

struct Staged {
    root: TempDir,
    units: RecordingUnitManager,
}

impl Staged {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            units: RecordingUnitManager::new(),
        }
    }

    fn path(&self, runtime: &str) -> PathBuf {
        Layout::rooted(self.root.path()).resolve(Path::new(runtime))
    }

    fn read(&self, runtime: &str) -> String {
        fs::read_to_string(self.path(runtime)).unwrap()
    }

    fn deployment(&self, yaml: &str) -> Deployment {
        Deployment::from_manifest(Manifest::parse(yaml).unwrap(), Layout::rooted(self.root.path()))
            .unwrap()
            .with_arch(Arch::Amd64)
    }

    async fn converge(&self, yaml: &str) -> ConvergenceReport {
        self.deployment(yaml)
            .converge(StubFetcher, &FsConfigStore::new(), &self.units)
            .await
            .unwrap()
    }
}

const BASIC_BUNDLE: &str = r"
bundles:
  test_service:
    vault_addr: https://vault.example.com
    vault_auth_method: token
    vault_token: test-vault-token
    pki_mount: test-pki
    pki_role_name: test-pki-role
    pki_common_name: test-pki-cn.example.com
    pki_cert_path: /etc/ssl/test-cert.pem
    pki_privkey_path: /etc/ssl/test-pkey.pem
";

#[tokio::test]
async fn basic_bundle_is_written_and_activated() {
    let staged = Staged::new();
    let report = staged.converge(BASIC_BUNDLE).await;
    assert!(report.is_success());

    assert_eq!(
        staged.read("/etc/vaultbot/vaultbot-test_service.conf"),
        "PKI_CERT_PATH='/etc/ssl/test-cert.pem'\n\
         PKI_COMMON_NAME='test-pki-cn.example.com'\n\
         PKI_MOUNT='test-pki'\n\
         PKI_PRIVKEY_PATH='/etc/ssl/test-pkey.pem'\n\
         PKI_ROLE_NAME='test-pki-role'\n\
         VAULT_ADDR='https://vault.example.com'\n\
         VAULT_AUTH_METHOD='token'\n\
         VAULT_TOKEN='test-vault-token'\n"
    );
    let mode = fs::metadata(staged.path("/etc/vaultbot/vaultbot-test_service.conf"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644);

    let calls = staged.units.calls();
    assert_eq!(calls.first(), Some(&UnitCall::DaemonReload));
    assert!(calls.contains(&UnitCall::SetUnit {
        unit: "vaultbot@test_service.timer".to_string(),
        state: UnitState::ACTIVE,
    }));
    assert!(calls.contains(&UnitCall::Restart {
        unit: "vaultbot@test_service.timer".to_string(),
    }));
}

#[tokio::test]
async fn default_install_layout_and_units() {
    let staged = Staged::new();
    let report = staged.converge("").await;
    assert!(report.install_changed);

    let binary = staged.path("/opt/vaultbot/v1.13.0/vaultbot");
    assert_eq!(report.binary, binary);
    assert_eq!(fs::read_link(staged.path("/usr/local/bin/vaultbot")).unwrap(), binary);

    assert_eq!(staged.read("/etc/vaultbot/vaultbot.conf"), "\n");

    let service = staged.read("/etc/systemd/system/vaultbot@.service");
    for line in [
        "EnvironmentFile=-/etc/vaultbot/vaultbot.conf",
        "EnvironmentFile=-/etc/vaultbot/vaultbot-%i.conf",
        "SyslogIdentifier=vaultbot-%i",
        "ExecStart=/usr/local/bin/vaultbot",
    ] {
        assert!(service.lines().any(|l| l == line), "missing {line}");
    }

    let timer = staged.read("/etc/systemd/system/vaultbot@.timer");
    for line in ["OnCalendar=daily", "OnBootSec=15min", "RandomizedDelaySec=15min"] {
        assert!(timer.lines().any(|l| l == line), "missing {line}");
    }
}

#[tokio::test]
async fn custom_deployment_parameters() {
    let staged = Staged::new();
    let report = staged
        .converge(
            r"
version: 1.23.4
download_url: https://example.com/vaultbot/v{version}{extension}
download_extension: .zip
checksum_verify: false
checksum_url: https://example.com/vaultbot/v{version}/checksums.txt
binary_name: vaultbot-1.23
archives_top_dir: /usr/local/share/vaultbot
etc_dir: /usr/local/etc/vaultbot
proxy_url: http://proxy.example.com:8766
on_calendar: '*-*-* 03:04:05'
on_boot_sec: ''
randomized_delay_sec: ''
exec_start: /usr/local/bin/vaultbot-1.23 -v
syslog_identifier: vaultbot-1.23-%i
settings:
  vault_addr: https://vault.example.com
  vault_client_timeout: 123
  pki_renew_percent: 0.85
  pki_force_renew: false
",
        )
        .await;
    assert!(report.is_success());

    let binary = staged.path("/usr/local/share/vaultbot/v1.23.4/vaultbot-1.23");
    assert_eq!(report.binary, binary);
    assert_eq!(
        fs::read_link(staged.path("/usr/local/bin/vaultbot-1.23")).unwrap(),
        binary
    );

    assert_eq!(
        staged.read("/usr/local/etc/vaultbot/vaultbot.conf"),
        "PKI_FORCE_RENEW='false'\n\
         PKI_RENEW_PERCENT='0.85'\n\
         VAULT_ADDR='https://vault.example.com'\n\
         VAULT_CLIENT_TIMEOUT='123'\n"
    );

    let service = staged.read("/etc/systemd/system/vaultbot@.service");
    assert!(service.contains("\nEnvironmentFile=-/usr/local/etc/vaultbot/vaultbot.conf\n"));
    assert!(service.contains("\nEnvironmentFile=-/usr/local/etc/vaultbot/vaultbot-%i.conf\n"));
    assert!(service.contains("\nSyslogIdentifier=vaultbot-1.23-%i\n"));
    assert!(service.contains("\nExecStart=/usr/local/bin/vaultbot-1.23 -v\n"));

    let timer = staged.read("/etc/systemd/system/vaultbot@.timer");
    assert!(timer.contains("\nOnCalendar=*-*-* 03:04:05\n"));
    assert!(!timer.contains("OnBootSec="));
    assert!(!timer.contains("RandomizedDelaySec="));
}

#[tokio::test]
async fn custom_bundle_params_render_every_field() {
    let staged = Staged::new();
    fs::create_dir_all(staged.root.path().join("secrets")).unwrap();
    let pkcs12_password = staged.root.path().join("secrets/pkcs12");
    fs::write(&pkcs12_password, "kenneth1234\n").unwrap();

    let yaml = format!(
        r"
bundles:
  test_service:
    logfile: /var/log/vaultbot.log
    renew_hook: /usr/local/bin/renew_hook
    auto_confirm: true
    vault_addr: https://vault.example.com
    vault_cacert: /etc/ssl/example.com.pem
    vault_capath: /etc/ssl/example.com.dir
    vault_client_cert: /etc/ssl/vaultbot_cert.pem
    vault_client_key: /etc/ssl/vaultbot_pkey.pem
    vault_client_timeout: 123
    vault_skip_verify: true
    vault_tls_server_name: vault.example.com
    vault_max_retries: 234
    vault_token: test-vault-token
    vault_renew_token: true
    vault_auth_method: token
    vault_certificate_role: vaultbot_cert_role
    vault_aws_auth_role: vaultbot_aws_role
    vault_aws_auth_mount: vaultbot_aws_mount
    vault_aws_auth_header: vaultbot_aws_header
    vault_aws_auth_nonce: vaultbot_aws_nonce
    vault_aws_auth_nonce_path: vaultbot_aws_nonce_path
    vault_app_role_mount: vaultbot_approle_mount
    vault_app_role_role_id: vault-app-role-id
    vault_app_role_secret_id: vault-app-secret-id
    pki_mount: test-pki
    pki_role_name: test-pki-role
    pki_common_name: test-pki-cn.example.com
    pki_alt_names: [test-a.example.com, test-b.example.com]
    pki_ip_sans: [1.2.3.4, 2.3.4.5]
    pki_ttl: 720h
    pki_exclude_cn_from_sans: true
    pki_private_key_format: der
    pki_renew_percent: 0.85
    pki_renew_time: 72h
    pki_force_renew: false
    pki_cert_path: /etc/ssl/test-cert.pem
    pki_cachain_path: /etc/ssl/test-chain.pem
    pki_privkey_path: /etc/ssl/test-pkey.pem
    pki_pembundle_path: /etc/ssl/test-bundle.pem
    pki_jks_path: /etc/ssl/test-keychain.jks
    pki_jks_password: kenneth123
    pki_jks_cert_alias: test-cert
    pki_jks_cachain_alias: test-chain
    pki_jks_privkey_alias: test-pkey
    pki_pkcs12_path: /etc/ssl/test-keychain.pkcs12
    pki_pkcs12_umask: '0640'
    pki_pkcs12_password: {{ file: {} }}
",
        pkcs12_password.display()
    );
    let report = staged.converge(&yaml).await;
    assert!(report.is_success(), "{:?}", report.failures);

    let mut expected = vec![
        ("logfile", "/var/log/vaultbot.log"),
        ("renew_hook", "/usr/local/bin/renew_hook"),
        ("auto_confirm", "true"),
        ("vault_addr", "https://vault.example.com"),
        ("vault_cacert", "/etc/ssl/example.com.pem"),
        ("vault_capath", "/etc/ssl/example.com.dir"),
        ("vault_client_cert", "/etc/ssl/vaultbot_cert.pem"),
        ("vault_client_key", "/etc/ssl/vaultbot_pkey.pem"),
        ("vault_client_timeout", "123"),
        ("vault_skip_verify", "true"),
        ("vault_tls_server_name", "vault.example.com"),
        ("vault_max_retries", "234"),
        ("vault_token", "test-vault-token"),
        ("vault_renew_token", "true"),
        ("vault_auth_method", "token"),
        ("vault_certificate_role", "vaultbot_cert_role"),
        ("vault_aws_auth_role", "vaultbot_aws_role"),
        ("vault_aws_auth_mount", "vaultbot_aws_mount"),
        ("vault_aws_auth_header", "vaultbot_aws_header"),
        ("vault_aws_auth_nonce", "vaultbot_aws_nonce"),
        ("vault_aws_auth_nonce_path", "vaultbot_aws_nonce_path"),
        ("vault_app_role_mount", "vaultbot_approle_mount"),
        ("vault_app_role_role_id", "vault-app-role-id"),
        ("vault_app_role_secret_id", "vault-app-secret-id"),
        ("pki_mount", "test-pki"),
        ("pki_role_name", "test-pki-role"),
        ("pki_common_name", "test-pki-cn.example.com"),
        ("pki_alt_names", "test-a.example.com,test-b.example.com"),
        ("pki_ip_sans", "1.2.3.4,2.3.4.5"),
        ("pki_ttl", "720h"),
        ("pki_exclude_cn_from_sans", "true"),
        ("pki_private_key_format", "der"),
        ("pki_renew_percent", "0.85"),
        ("pki_renew_time", "72h"),
        ("pki_force_renew", "false"),
        ("pki_cert_path", "/etc/ssl/test-cert.pem"),
        ("pki_cachain_path", "/etc/ssl/test-chain.pem"),
        ("pki_privkey_path", "/etc/ssl/test-pkey.pem"),
        ("pki_pembundle_path", "/etc/ssl/test-bundle.pem"),
        ("pki_jks_path", "/etc/ssl/test-keychain.jks"),
        ("pki_jks_password", "kenneth123"),
        ("pki_jks_cert_alias", "test-cert"),
        ("pki_jks_cachain_alias", "test-chain"),
        ("pki_jks_privkey_alias", "test-pkey"),
        ("pki_pkcs12_path", "/etc/ssl/test-keychain.pkcs12"),
        ("pki_pkcs12_umask", "0640"),
        ("pki_pkcs12_password", "kenneth1234"),
    ];
    expected.sort_unstable();
    let expected: String = expected
        .iter()
        .map(|(key, value)| format!("{}='{value}'\n", key.to_uppercase()))
        .collect();

    assert_eq!(staged.read("/etc/vaultbot/vaultbot-test_service.conf"), expected);
}

#[tokio::test]
async fn absent_bundle_is_removed_and_deactivated() {
    let staged = Staged::new();
    let path = staged.path("/etc/vaultbot/vaultbot-test_service.conf");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "VAULT_ADDR='https://vault.example.com'\n").unwrap();

    let report = staged
        .converge("bundles:\n  test_service:\n    ensure: absent\n")
        .await;
    assert!(report.is_success());
    assert!(!path.exists());
    assert!(staged.units.calls().contains(&UnitCall::SetUnit {
        unit: "vaultbot@test_service.timer".to_string(),
        state: UnitState::INACTIVE,
    }));
}

#[tokio::test]
async fn global_settings_satisfy_bundle_requirements() {
    let staged = Staged::new();
    let report = staged
        .converge(
            r"
settings:
  vault_addr: https://vault.example.com
  vault_auth_method: token
  vault_token: test-vault-token
  pki_mount: test-pki
  pki_role_name: test-pki-role
bundles:
  test_service:
    pki_common_name: test-pki-cn.example.com
    pki_cert_path: /etc/ssl/test-cert.pem
    pki_privkey_path: /etc/ssl/test-pkey.pem
",
        )
        .await;
    assert!(report.is_success(), "{:?}", report.failures);

    // Shared values stay in the global file only.
    assert_eq!(
        staged.read("/etc/vaultbot/vaultbot-test_service.conf"),
        "PKI_CERT_PATH='/etc/ssl/test-cert.pem'\n\
         PKI_COMMON_NAME='test-pki-cn.example.com'\n\
         PKI_PRIVKEY_PATH='/etc/ssl/test-pkey.pem'\n"
    );
    assert_eq!(staged.read("/etc/vaultbot/vaultbot.conf").lines().count(), 5);
}

#[tokio::test]
async fn empty_bundle_value_does_not_fall_back_to_global() {
    let staged = Staged::new();
    let report = staged
        .converge(
            r"
settings:
  vault_addr: https://vault.example.com
  vault_token: global-token
  pki_mount: test-pki
  pki_role_name: test-pki-role
bundles:
  test_service:
    vault_token: ''
    pki_common_name: test-pki-cn.example.com
    pki_cert_path: /etc/ssl/test-cert.pem
",
        )
        .await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "test_service");
    assert_eq!(report.failures[0].error, "$vault_token is required");
    assert!(!staged.path("/etc/vaultbot/vaultbot-test_service.conf").exists());
}

#[tokio::test]
async fn global_settings_change_restarts_bundles() {
    let staged = Staged::new();
    let manifest = |addr: &str| {
        format!(
            r"
settings:
  vault_addr: {addr}
  vault_token: test-vault-token
  pki_mount: test-pki
  pki_role_name: test-pki-role
bundles:
  test_service:
    pki_common_name: test-pki-cn.example.com
    pki_cert_path: /etc/ssl/test-cert.pem
"
        )
    };
    staged.converge(&manifest("https://vault-a.example.com")).await;
    let calls_after_first = staged.units.calls().len();

    let second = staged.converge(&manifest("https://vault-b.example.com")).await;
    assert!(second.global_config_changed);
    assert!(!second.bundles[0].config_changed);
    assert!(second.bundles[0].restarted);
    assert!(staged.units.calls()[calls_after_first..].contains(&UnitCall::Restart {
        unit: "vaultbot@test_service.timer".to_string(),
    }));
}

#[tokio::test]
async fn failing_bundle_does_not_block_others() {
    let staged = Staged::new();
    let report = staged
        .converge(
            r"
settings:
  vault_addr: https://vault.example.com
  vault_token: test-vault-token
  pki_mount: test-pki
  pki_role_name: test-pki-role
bundles:
  broken:
    pki_common_name: broken.example.com
  working:
    pki_common_name: working.example.com
    pki_pembundle_path: /etc/ssl/working.pem
",
        )
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "broken");
    assert_eq!(
        report.failures[0].error,
        "$pki_cert_path or another output path is required"
    );
    assert!(!staged.path("/etc/vaultbot/vaultbot-broken.conf").exists());

    assert_eq!(report.bundles.len(), 1);
    assert_eq!(report.bundles[0].name, "working");
    assert!(staged.path("/etc/vaultbot/vaultbot-working.conf").exists());
}

#[tokio::test]
async fn unresolvable_secret_fails_only_that_bundle() {
    let staged = Staged::new();
    let yaml = BASIC_BUNDLE.replace(
        "vault_token: test-vault-token",
        "vault_token: { env: VAULTBOT_DEPLOY_TEST_UNSET_TOKEN }",
    );
    let report = staged.converge(&yaml).await;

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("VAULTBOT_DEPLOY_TEST_UNSET_TOKEN"));
    assert!(!staged.path("/etc/vaultbot/vaultbot-test_service.conf").exists());
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let staged = Staged::new();
    let first = staged.converge(BASIC_BUNDLE).await;
    assert!(first.changed());

    let calls_after_first = staged.units.calls().len();
    let second = staged.converge(BASIC_BUNDLE).await;
    assert!(!second.changed());
    assert!(!second.bundles[0].restarted);

    // Only the instance state is re-asserted.
    let calls = staged.units.calls();
    assert_eq!(
        &calls[calls_after_first..],
        &[UnitCall::SetUnit {
            unit: "vaultbot@test_service.timer".to_string(),
            state: UnitState::ACTIVE,
        }]
    );
}

#[tokio::test]
async fn unmanaged_service_leaves_units_alone() {
    let staged = Staged::new();
    let yaml = format!("service_manage: false\n{BASIC_BUNDLE}");
    let report = staged.converge(&yaml).await;

    assert!(report.is_success());
    assert!(!staged.path("/etc/systemd/system/vaultbot@.service").exists());
    assert!(!staged.path("/etc/systemd/system/vaultbot@.timer").exists());
    assert!(staged.path("/etc/vaultbot/vaultbot-test_service.conf").exists());
    assert!(staged.units.calls().is_empty());
}

#[tokio::test]
async fn absent_deployment_removes_everything() {
    let staged = Staged::new();
    staged.converge(BASIC_BUNDLE).await;

    let yaml = format!("ensure: absent\n{BASIC_BUNDLE}");
    let report = staged.converge(&yaml).await;
    assert!(report.is_success());
    assert!(report.changed());

    for path in [
        "/opt/vaultbot",
        "/etc/vaultbot",
        "/etc/systemd/system/vaultbot@.service",
        "/etc/systemd/system/vaultbot@.timer",
    ] {
        assert!(!staged.path(path).exists(), "{path} still exists");
    }
    assert!(fs::symlink_metadata(staged.path("/usr/local/bin/vaultbot")).is_err());
    assert!(staged.units.calls().contains(&UnitCall::SetUnit {
        unit: "vaultbot@test_service.timer".to_string(),
        state: UnitState::INACTIVE,
    }));
}

#[test]
fn report_serializes_to_json() {
    let staged = Staged::new();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let report = runtime.block_on(staged.converge(BASIC_BUNDLE));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ensure"], "present");
    assert_eq!(json["bundles"][0]["name"], "test_service");
    assert!(json["started_at"].is_string());
}
