//! Quarry CLI
//!
//! Command-line interface for Quarry search backends.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use quarry_cli::cli::{Args, Command};
use quarry_cli::commands::{self, SearchArgs};
use quarry_cli::config::QuarryConfig;
use quarry_cli::config_handlers;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "debug"
    } else {
        "info,quarry=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config_path = args.config.as_deref();
    match args.command {
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
        }
        Command::Backends => {
            let config = QuarryConfig::load(config_path)?;
            commands::list_backends(&config);
        }
        Command::UpdateIndex {
            backend,
            batch_size,
        } => {
            let config = QuarryConfig::load(config_path)?;
            commands::update_index(&config, &backend, batch_size).await?;
        }
        Command::Search {
            text,
            record_type,
            filters,
            backend,
            limit,
            offset,
            mode,
        } => {
            let config = QuarryConfig::load(config_path)?;
            let shown = commands::search(
                &config,
                SearchArgs {
                    text,
                    record_type,
                    filters,
                    backend,
                    limit,
                    offset,
                    mode,
                },
            )
            .await?;
            if shown == 0 {
                tracing::info!("No matches");
            }
        }
    }

    Ok(())
}
