//! Render command implementation.
//!
//! Prints a config file exactly as `apply` would write it. Secrets are
//! resolved, so the output contains them in plaintext.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use vaultbot_deploy::BundlePlan;

use super::ManifestArgs;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Bundle to render
    #[arg(required_unless_present = "global", conflicts_with = "global")]
    pub bundle: Option<String>,

    /// Render the global config file instead of a bundle
    #[arg(long)]
    pub global: bool,
}

/// Runs the render command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the bundle does not
/// exist or fails validation, or a secret cannot be resolved.
pub fn run(args: &RenderArgs) -> Result<()> {
    let deployment = args.manifest.load()?;

    let rendered = match args.bundle.as_deref() {
        Some(name) => {
            let bundle = deployment.bundle(name)?;
            match deployment.plan(bundle)? {
                BundlePlan::Present { config, .. } => config,
                BundlePlan::Absent { .. } => {
                    eprintln!("Bundle {name} is absent; nothing is rendered");
                    return Ok(());
                }
            }
        }
        None => deployment.render_global()?,
    };

    std::io::stdout()
        .write_all(rendered.as_bytes())
        .context("Failed to write to stdout")?;
    Ok(())
}
