//! Matpack CLI - Command-line client for the data-packaging service.
//!
//! The main entry point for the `matpack` CLI binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matpack_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.config();

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Schedule(args) => {
                matpack_cli::commands::schedule::execute(args, &config).await
            }
            Commands::Augment(args) => matpack_cli::commands::augment::execute(args, &config).await,
            Commands::Status(args) => matpack_cli::commands::status::execute(args, &config).await,
            Commands::Fetch(args) => matpack_cli::commands::fetch::execute(args, &config).await,
            Commands::Available(args) => {
                matpack_cli::commands::available::execute(&args, &config).await
            }
        }
    })
}
