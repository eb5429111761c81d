//! Whole-deployment convergence.
//!
//! Order when present: install the agent, write the global config, write the
//! unit templates, then converge every bundle. Order when absent is the
//! reverse. Bundles are independent: a failing bundle is recorded in the
//! report and the remaining bundles are still converged.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use vaultbot_core::{
    render, validate, BundleSpec, Ensure, RenderedConfig, ValidationError,
};
use vaultbot_installer::{Arch, ArtifactFetcher, InstallConfig, Installer};
use vaultbot_systemd::{Schedule, UnitManager, UnitTemplate};

use crate::error::{DeployError, Result};
use crate::layout::{ConfigPaths, Layout};
use crate::lifecycle::{plan_bundle, BundleOutcome, BundlePlan, BundleTarget};
use crate::manifest::Manifest;
use crate::store::{ConfigStore, DIR_MODE, FILE_MODE};

/// A bundle that could not be converged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleFailure {
    /// Bundle name.
    pub name: String,
    /// Error message.
    pub error: String,
}

/// Result of a convergence run.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Desired state of the deployment.
    pub ensure: String,
    /// Agent binary path.
    pub binary: PathBuf,
    /// Whether the installation changed.
    pub install_changed: bool,
    /// Whether the global config file changed.
    pub global_config_changed: bool,
    /// Whether a unit template changed.
    pub units_changed: bool,
    /// Bundles converged successfully.
    pub bundles: Vec<BundleOutcome>,
    /// Bundles that failed.
    pub failures: Vec<BundleFailure>,
}

impl ConvergenceReport {
    /// Returns true if every bundle converged.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true if anything on the system changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.install_changed
            || self.global_config_changed
            || self.units_changed
            || self.bundles.iter().any(|b| b.config_changed)
    }
}

/// A parsed manifest bound to a filesystem layout.
#[derive(Debug)]
pub struct Deployment {
    manifest: Manifest,
    bundles: Vec<BundleSpec>,
    layout: Layout,
    arch: Option<Arch>,
}

impl Deployment {
    /// Builds a deployment from a manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundle name cannot be used for files and units.
    pub fn from_manifest(mut manifest: Manifest, layout: Layout) -> Result<Self> {
        let bundles = std::mem::take(&mut manifest.bundles)
            .into_iter()
            .map(|(name, definition)| BundleSpec::from_definition(name, definition))
            .collect::<vaultbot_core::Result<Vec<_>>>()?;

        Ok(Self {
            manifest,
            bundles,
            layout,
            arch: None,
        })
    }

    /// Pins the release architecture instead of detecting the host's.
    #[must_use]
    pub const fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Returns the manifest (without its bundles).
    #[must_use]
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Returns the bundles, sorted by name.
    #[must_use]
    pub fn bundles(&self) -> &[BundleSpec] {
        &self.bundles
    }

    /// Returns the layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Looks up a bundle by name.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::BundleNotFound`] if no such bundle is declared.
    pub fn bundle(&self, name: &str) -> Result<&BundleSpec> {
        self.bundles
            .iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| DeployError::BundleNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the runtime config and unit directories.
    #[must_use]
    pub fn config_paths(&self) -> ConfigPaths {
        ConfigPaths {
            etc_dir: self.manifest.etc_dir.clone(),
            systemd_dir: self.manifest.systemd_dir.clone(),
        }
    }

    /// Returns the unit templates described by the manifest.
    #[must_use]
    pub fn unit_template(&self) -> UnitTemplate {
        let paths = self.config_paths();
        UnitTemplate::new(
            self.manifest.exec_start(),
            vec![paths.global_config(), paths.bundle_config("%i")],
        )
        .with_syslog_identifier(&self.manifest.syslog_identifier)
        .with_schedule(Schedule {
            on_calendar: self.manifest.on_calendar.clone(),
            on_boot_sec: self.manifest.on_boot_sec.clone(),
            randomized_delay_sec: self.manifest.randomized_delay_sec.clone(),
        })
    }

    /// Returns the install configuration, with directories under the layout root.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the host architecture
    /// has no release.
    pub fn install_config(&self) -> Result<InstallConfig> {
        let arch = match self.arch {
            Some(arch) => arch,
            None => Arch::host()?,
        };
        let manifest = &self.manifest;

        let mut config = InstallConfig::new(arch)
            .with_version(&manifest.version)
            .with_archives_top_dir(self.layout.resolve(&manifest.archives_top_dir))
            .with_bin_dir(self.layout.resolve(&manifest.bin_dir));
        config.download_url.clone_from(&manifest.download_url);
        config.download_extension.clone_from(&manifest.download_extension);
        config.checksum_verify = manifest.checksum_verify;
        config.checksum_url.clone_from(&manifest.checksum_url);
        config.binary_name.clone_from(&manifest.binary_name);

        if let Some(proxy) = manifest.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            let proxy = Url::parse(proxy).map_err(|e| DeployError::InvalidValue {
                field: "proxy_url".to_string(),
                reason: e.to_string(),
            })?;
            config = config.with_proxy(proxy);
        }

        Ok(config)
    }

    /// Returns the file and unit of a bundle.
    #[must_use]
    pub fn target(&self, bundle: &BundleSpec) -> BundleTarget {
        BundleTarget {
            config_path: self.config_paths().bundle_config(bundle.name()),
            instance: self.unit_template().instance(bundle.name()),
        }
    }

    /// Plans a bundle. Everything is absent when the deployment is absent.
    ///
    /// # Errors
    ///
    /// Returns a validation or rendering error.
    pub fn plan(&self, bundle: &BundleSpec) -> Result<BundlePlan> {
        let target = self.target(bundle);
        if self.manifest.ensure == Ensure::Absent {
            return Ok(BundlePlan::Absent {
                name: bundle.name().to_string(),
                target,
            });
        }
        plan_bundle(bundle, &self.manifest.settings, target)
    }

    /// Renders the global config file.
    ///
    /// # Errors
    ///
    /// Returns an error if a sensitive value cannot be revealed.
    pub fn render_global(&self) -> Result<RenderedConfig> {
        Ok(render(&self.manifest.settings)?)
    }

    /// Validates every bundle and returns all failures, in bundle order.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(&str, ValidationError)> {
        self.bundles
            .iter()
            .filter_map(|bundle| {
                validate(bundle, &self.manifest.settings)
                    .err()
                    .map(|e| (bundle.name(), e))
            })
            .collect()
    }

    /// Converges the system to the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if installation, the global config or the unit
    /// templates fail. Bundle failures are reported in the
    /// [`ConvergenceReport`] instead.
    pub async fn converge<F: ArtifactFetcher>(
        &self,
        fetcher: F,
        store: &dyn ConfigStore,
        units: &dyn UnitManager,
    ) -> Result<ConvergenceReport> {
        let started_at = Utc::now();
        let installer = Installer::new(self.install_config()?, fetcher);
        let units = self.manifest.service_manage.then_some(units);
        let ensure = self.manifest.ensure;
        info!(%ensure, bundles = self.bundles.len(), "Converging deployment");

        let mut report = ConvergenceReport {
            started_at,
            finished_at: started_at,
            ensure: ensure.to_string(),
            binary: installer.config().binary_path(),
            install_changed: false,
            global_config_changed: false,
            units_changed: false,
            bundles: Vec::new(),
            failures: Vec::new(),
        };

        match ensure {
            Ensure::Present => {
                let install = installer.install().await?;
                report.install_changed = install.changed;
                report.global_config_changed = self.write_global_config(store)?;
                if let Some(units) = units {
                    report.units_changed = self.write_unit_templates(store, units)?;
                }
                let shared_changed = report.install_changed
                    || report.global_config_changed
                    || report.units_changed;
                self.converge_bundles(store, units, shared_changed, &mut report);
            }
            Ensure::Absent => {
                self.converge_bundles(store, units, false, &mut report);
                if let Some(units) = units {
                    report.units_changed = self.remove_unit_templates(store, units)?;
                }
                report.global_config_changed = self.remove_global_config(store)?;
                report.install_changed = installer.uninstall().await?;
            }
        }

        report.finished_at = Utc::now();
        info!(
            changed = report.changed(),
            converged = report.bundles.len(),
            failed = report.failures.len(),
            "Convergence finished"
        );
        Ok(report)
    }

    fn converge_bundles(
        &self,
        store: &dyn ConfigStore,
        units: Option<&dyn UnitManager>,
        shared_changed: bool,
        report: &mut ConvergenceReport,
    ) {
        for bundle in &self.bundles {
            let result = self
                .plan(bundle)
                .and_then(|plan| plan.apply(&self.layout, store, units, shared_changed));
            match result {
                Ok(outcome) => report.bundles.push(outcome),
                Err(e) => {
                    error!(bundle = %bundle.name(), error = %e, "Bundle failed");
                    report.failures.push(BundleFailure {
                        name: bundle.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn write_global_config(&self, store: &dyn ConfigStore) -> Result<bool> {
        let paths = self.config_paths();
        let mut changed = store.ensure_dir(&self.layout.resolve(&paths.etc_dir), DIR_MODE)?;
        let global = self.render_global()?;
        changed |= store.write(
            &self.layout.resolve(&paths.global_config()),
            global.as_bytes(),
            FILE_MODE,
        )?;
        Ok(changed)
    }

    fn remove_global_config(&self, store: &dyn ConfigStore) -> Result<bool> {
        let paths = self.config_paths();
        let mut changed = store.remove(&self.layout.resolve(&paths.global_config()))?;
        changed |= store.remove_dir(&self.layout.resolve(&paths.etc_dir))?;
        Ok(changed)
    }

    fn write_unit_templates(&self, store: &dyn ConfigStore, units: &dyn UnitManager) -> Result<bool> {
        let template = self.unit_template();
        let dir = self.layout.resolve(&self.manifest.systemd_dir);
        store.ensure_dir(&dir, DIR_MODE)?;

        let mut changed = store.write(
            &dir.join(template.service_name()),
            template.render_service().as_bytes(),
            FILE_MODE,
        )?;
        changed |= store.write(
            &dir.join(template.timer_name()),
            template.render_timer().as_bytes(),
            FILE_MODE,
        )?;

        if changed {
            units.daemon_reload()?;
        }
        Ok(changed)
    }

    fn remove_unit_templates(&self, store: &dyn ConfigStore, units: &dyn UnitManager) -> Result<bool> {
        let template = self.unit_template();
        let dir = self.layout.resolve(&self.manifest.systemd_dir);

        let mut changed = store.remove(&dir.join(template.service_name()))?;
        changed |= store.remove(&dir.join(template.timer_name()))?;

        if changed {
            units.daemon_reload()?;
        }
        Ok(changed)
    }
}
