//! Cachet - Vary-aware HTTP response cache store
//!
//! CLI entry point that dispatches to subcommands.

use cachet::cli::{Cli, Commands};
use cachet::config::{ConfigManager, GeneralConfig};
use cachet::error::CachetResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
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

async fn run() -> CachetResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Lookup(args) => cachet::cli::commands::lookup(args, &config).await,
        Commands::Purge(args) => cachet::cli::commands::purge(args, &config).await,
        Commands::Lock(args) => cachet::cli::commands::lock(args, &config).await,
        Commands::Unlock(args) => cachet::cli::commands::unlock(args, &config).await,
        Commands::LockStatus(args) => cachet::cli::commands::lock_status(args, &config).await,
        Commands::Cleanup => cachet::cli::commands::cleanup(&config).await,
        Commands::Config(args) => {
            cachet::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` raises 0 to info
fn init_logging(verbosity: u8, general: &GeneralConfig) {
    let level = match verbosity {
        0 if general.verbose => 1,
        n => n,
    };
    let filter = match level {
        0 => EnvFilter::new("cachet=warn"),
        1 => EnvFilter::new("cachet=info"),
        _ => EnvFilter::new("cachet=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if general.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
