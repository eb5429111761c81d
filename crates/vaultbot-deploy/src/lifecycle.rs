//! Per-bundle lifecycle.
//!
//! A bundle is either present (config file written, timer instance enabled
//! and running) or absent (file removed, instance stopped and disabled).
//! Planning validates and renders; applying touches the system.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use vaultbot_core::{render_bundle, validate, AgentSettings, BundleSpec, Ensure, RenderedConfig};
use vaultbot_systemd::{UnitManager, UnitState};

use crate::error::Result;
use crate::layout::Layout;
use crate::store::{ConfigStore, FILE_MODE};

/// Where a bundle lives on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTarget {
    /// Runtime path of the bundle config file.
    pub config_path: PathBuf,
    /// Timer instance running the bundle, e.g. `vaultbot@www.timer`.
    pub instance: String,
}

/// What applying a bundle will do.
#[derive(Debug)]
pub enum BundlePlan {
    /// Write the config and activate the instance.
    Present {
        /// Bundle name.
        name: String,
        /// File and unit.
        target: BundleTarget,
        /// Rendered config file content.
        config: RenderedConfig,
    },
    /// Remove the config and deactivate the instance.
    Absent {
        /// Bundle name.
        name: String,
        /// File and unit.
        target: BundleTarget,
    },
}

/// What applying a bundle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOutcome {
    /// Bundle name.
    pub name: String,
    /// Desired state that was applied.
    pub ensure: String,
    /// Whether the config file was written or removed.
    pub config_changed: bool,
    /// Whether the instance was restarted to pick up new config.
    pub restarted: bool,
}

/// Validates and renders a bundle.
///
/// Absent bundles skip validation and rendering entirely.
///
/// # Errors
///
/// Returns the first missing parameter, or a secret resolution failure.
pub fn plan_bundle(
    bundle: &BundleSpec,
    defaults: &AgentSettings,
    target: BundleTarget,
) -> Result<BundlePlan> {
    let name = bundle.name().to_string();
    if bundle.ensure() == Ensure::Absent {
        return Ok(BundlePlan::Absent { name, target });
    }

    let validated = validate(bundle, defaults)?;
    let config = render_bundle(&validated)?;
    Ok(BundlePlan::Present {
        name,
        target,
        config,
    })
}

impl BundlePlan {
    /// Returns the bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Present { name, .. } | Self::Absent { name, .. } => name,
        }
    }

    /// Returns the bundle's file and unit.
    #[must_use]
    pub const fn target(&self) -> &BundleTarget {
        match self {
            Self::Present { target, .. } | Self::Absent { target, .. } => target,
        }
    }

    /// Applies the plan.
    ///
    /// `units` is `None` when unit management is disabled; only the file is
    /// touched then. The file is written before the instance is started so
    /// the first run sees the new config.
    ///
    /// A present instance is restarted when its own file changed or when
    /// `shared_changed` reports a change to something every instance loads
    /// (global config, unit templates, binary).
    ///
    /// # Errors
    ///
    /// Returns an error if the file operation or the service manager fails.
    pub fn apply(
        &self,
        layout: &Layout,
        store: &dyn ConfigStore,
        units: Option<&dyn UnitManager>,
        shared_changed: bool,
    ) -> Result<BundleOutcome> {
        let target = self.target();
        let path = layout.resolve(&target.config_path);

        match self {
            Self::Present { name, config, .. } => {
                let config_changed = store.write(&path, config.as_bytes(), FILE_MODE)?;
                let mut restarted = false;
                if let Some(units) = units {
                    units.set_unit(&target.instance, UnitState::ACTIVE)?;
                    if config_changed || shared_changed {
                        units.restart(&target.instance)?;
                        restarted = true;
                    }
                }
                info!(bundle = %name, changed = config_changed, "Bundle present");
                Ok(outcome(name, Ensure::Present, config_changed, restarted))
            }
            Self::Absent { name, .. } => {
                let config_changed = remove_config(store, &path, name)?;
                if let Some(units) = units {
                    units.set_unit(&target.instance, UnitState::INACTIVE)?;
                }
                info!(bundle = %name, changed = config_changed, "Bundle absent");
                Ok(outcome(name, Ensure::Absent, config_changed, false))
            }
        }
    }
}

fn remove_config(store: &dyn ConfigStore, path: &Path, name: &str) -> Result<bool> {
    let removed = store.remove(path)?;
    if !removed {
        warn!(bundle = %name, path = %path.display(), "Absent bundle had no config file");
    }
    Ok(removed)
}

fn outcome(name: &str, ensure: Ensure, config_changed: bool, restarted: bool) -> BundleOutcome {
    BundleOutcome {
        name: name.to_string(),
        ensure: ensure.to_string(),
        config_changed,
        restarted,
    }
}
