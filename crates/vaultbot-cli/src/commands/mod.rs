//! CLI commands and argument parsing.

pub mod apply;
pub mod render;
pub mod units;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use vaultbot_deploy::{Deployment, Layout, Manifest};

/// vaultbot-deploy - install vaultbot and manage its certificate bundles
#[derive(Parser)]
#[command(name = "vaultbot-deploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Converge the host to the manifest
    Apply(apply::ApplyArgs),

    /// Validate every bundle in the manifest
    Validate(validate::ValidateArgs),

    /// Print a rendered config file
    Render(render::RenderArgs),

    /// Print the rendered systemd unit templates
    Units(units::UnitsArgs),

    /// Print version information
    Version,
}

/// Manifest location shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Path to the deployment manifest
    #[arg(short, long, env = "VAULTBOT_MANIFEST", default_value = "/etc/vaultbot/deploy.yaml")]
    pub manifest: PathBuf,

    /// Stage every managed path under this directory
    #[arg(long, env = "VAULTBOT_ROOT")]
    pub root: Option<PathBuf>,
}

impl ManifestArgs {
    /// Returns the layout selected by `--root`.
    pub fn layout(&self) -> Layout {
        self.root
            .as_ref()
            .map_or_else(Layout::system, Layout::rooted)
    }

    /// Loads the manifest and binds it to the layout.
    pub fn load(&self) -> Result<Deployment> {
        debug!(manifest = %self.manifest.display(), "Loading manifest");
        let manifest = Manifest::from_path(&self.manifest)
            .with_context(|| format!("Failed to load manifest {}", self.manifest.display()))?;
        Deployment::from_manifest(manifest, self.layout()).context("Invalid manifest")
    }
}
