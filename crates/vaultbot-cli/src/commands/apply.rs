//! Apply command implementation.
//!
//! Installs the agent, writes the global config and unit templates, and
//! converges every bundle.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use vaultbot_deploy::{ConvergenceReport, FsConfigStore};
use vaultbot_installer::HttpArtifactFetcher;
use vaultbot_systemd::{RecordingUnitManager, SystemdUnitManager, UnitCall, UnitManager};

use super::ManifestArgs;

/// Arguments for the apply command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Record systemctl requests instead of running them
    #[arg(long, env = "VAULTBOT_SKIP_SYSTEMCTL")]
    pub skip_systemctl: bool,

    /// Download timeout in seconds
    #[arg(long, default_value = "120")]
    pub timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for the convergence report.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Executes the apply command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, installation or unit
/// setup fails, or any bundle fails to converge.
pub async fn execute(args: ApplyArgs) -> Result<()> {
    let deployment = args.manifest.load()?;
    info!(
        manifest = %args.manifest.manifest.display(),
        bundles = deployment.bundles().len(),
        "Applying deployment"
    );

    let fetcher = HttpArtifactFetcher::new(Duration::from_secs(args.timeout));
    let store = FsConfigStore::new();
    let recorder = RecordingUnitManager::new();
    let systemd = SystemdUnitManager::new();
    let units: &dyn UnitManager = if args.skip_systemctl {
        warn!("Skipping systemctl; requests are only recorded");
        &recorder
    } else {
        &systemd
    };

    let report = deployment
        .converge(fetcher, &store, units)
        .await
        .context("Convergence failed")?;

    match args.format {
        OutputFormat::Text => print_text_report(&report, &recorder.calls()),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if !report.is_success() {
        anyhow::bail!("{} bundle(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_text_report(report: &ConvergenceReport, recorded: &[UnitCall]) {
    println!("vaultbot deployment ({})", report.ensure);
    println!("=======================");
    println!("Binary: {}", report.binary.display());
    println!(
        "Install: {}  Global config: {}  Units: {}",
        changed_label(report.install_changed),
        changed_label(report.global_config_changed),
        changed_label(report.units_changed)
    );
    println!();

    for bundle in &report.bundles {
        let restarted = if bundle.restarted { ", restarted" } else { "" };
        println!(
            "✓ {} ({}, {}{restarted})",
            bundle.name,
            bundle.ensure,
            changed_label(bundle.config_changed)
        );
    }
    for failure in &report.failures {
        println!("✗ {}: {}", failure.name, failure.error);
    }

    if !recorded.is_empty() {
        println!("\nSkipped systemctl requests:");
        for call in recorded {
            println!("  {}", describe(call));
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\n{} converged, {} failed in {}ms",
        report.bundles.len(),
        report.failures.len(),
        elapsed.num_milliseconds()
    );
}

const fn changed_label(changed: bool) -> &'static str {
    if changed {
        "changed"
    } else {
        "unchanged"
    }
}

fn describe(call: &UnitCall) -> String {
    match call {
        UnitCall::DaemonReload => "systemctl daemon-reload".to_string(),
        UnitCall::SetUnit { unit, state } => format!(
            "systemctl {} {} ({})",
            if state.enabled { "enable" } else { "disable" },
            unit,
            if state.running { "running" } else { "stopped" }
        ),
        UnitCall::Restart { unit } => format!("systemctl restart {unit}"),
    }
}

#[cfg(test)]
mod tests {
    use vaultbot_systemd::UnitState;

    use super::*;

    #[test]
    fn test_describe_calls() {
        assert_eq!(describe(&UnitCall::DaemonReload), "systemctl daemon-reload");
        assert_eq!(
            describe(&UnitCall::SetUnit {
                unit: "vaultbot@www.timer".to_string(),
                state: UnitState::ACTIVE,
            }),
            "systemctl enable vaultbot@www.timer (running)"
        );
        assert_eq!(
            describe(&UnitCall::Restart {
                unit: "vaultbot@www.timer".to_string(),
            }),
            "systemctl restart vaultbot@www.timer"
        );
    }

    #[test]
    fn test_changed_label() {
        assert_eq!(changed_label(true), "changed");
        assert_eq!(changed_label(false), "unchanged");
    }
}
