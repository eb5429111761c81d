//! Units command implementation.

use anyhow::Result;
use clap::Args;

use super::ManifestArgs;

/// Arguments for the units command.
#[derive(Args, Debug)]
pub struct UnitsArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/// Runs the units command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded.
pub fn run(args: &UnitsArgs) -> Result<()> {
    let deployment = args.manifest.load()?;
    let template = deployment.unit_template();
    let dir = &deployment.manifest().systemd_dir;

    if !deployment.manifest().service_manage {
        eprintln!("service_manage is false; these units are not installed");
    }

    println!("# {}", dir.join(template.service_name()).display());
    print!("{}", template.render_service());
    println!();
    println!("# {}", dir.join(template.timer_name()).display());
    print!("{}", template.render_timer());
    Ok(())
}
