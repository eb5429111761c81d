//! vaultbot-deploy - converges a host to a vaultbot deployment manifest.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply(args) => commands::apply::execute(args).await,
        Commands::Validate(args) => commands::validate::run(&args),
        Commands::Render(args) => commands::render::run(&args),
        Commands::Units(args) => commands::units::run(&args),
        Commands::Version => {
            println!("vaultbot-deploy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
