//! podpatch - patch and update container images
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use podpatch::backend::update::UpdateKind;
use podpatch::cli::{Cli, Commands};
use podpatch::config::ConfigManager;
use podpatch::error::PodpatchResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PodpatchResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("podpatch=warn"),
        1 => EnvFilter::new("podpatch=info"),
        _ => EnvFilter::new("podpatch=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Dispatch to command
    match cli.command {
        Commands::ListUpdates(args) => podpatch::cli::commands::list_updates(args, &config).await,
        Commands::Update(args) => {
            podpatch::cli::commands::update(args, UpdateKind::General, &config).await
        }
        Commands::Patch(args) => {
            podpatch::cli::commands::update(args, UpdateKind::Security, &config).await
        }
        Commands::Ps => podpatch::cli::commands::ps(&config).await,
        Commands::Cache(args) => podpatch::cli::commands::cache(args, &config).await,
    }
}
