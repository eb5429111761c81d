//! Validate command implementation.

use anyhow::Result;
use clap::Args;
use tracing::info;

use vaultbot_core::Ensure;

use super::ManifestArgs;

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Also resolve secrets and render every bundle
    #[arg(long)]
    pub render: bool,
}

/// Runs the validate command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any bundle is invalid.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let deployment = args.manifest.load()?;
    info!(manifest = %args.manifest.manifest.display(), "Validating manifest");

    println!("vaultbot Manifest Validator");
    println!("===========================");
    println!("Manifest: {}", args.manifest.manifest.display());
    println!();

    let failures = deployment.validate_all();
    let mut errors = failures.len();

    for bundle in deployment.bundles() {
        if let Some((_, error)) = failures.iter().find(|(name, _)| *name == bundle.name()) {
            println!("✗ {}: {error}", bundle.name());
            continue;
        }
        if bundle.ensure() == Ensure::Absent {
            println!("✓ {} (absent)", bundle.name());
            continue;
        }
        if args.render {
            if let Err(e) = deployment.plan(bundle) {
                println!("✗ {}: {e}", bundle.name());
                errors += 1;
                continue;
            }
        }
        println!("✓ {}", bundle.name());
    }

    if args.render {
        if let Err(e) = deployment.render_global() {
            println!("✗ global settings: {e}");
            errors += 1;
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} validation error(s)");
    }

    println!("\n✓ {} bundle(s) validated successfully", deployment.bundles().len());
    Ok(())
}
