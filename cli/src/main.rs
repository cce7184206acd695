// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Policy Server CLI
//!
//! Administration entry point for the network policy store.
//!
//! ## Commands
//!
//! - `policy-server config show|validate` - Configuration management
//! - `policy-server migrate` - Create the policy tables
//! - `policy-server destinations list|create|update|delete` - Egress destinations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use policy_server::commands::{self, ConfigCommand, DestinationsCommand};
use policy_server::services::Services;
use policy_server_core::domain::server_config::PolicyServerConfig;

/// Network policy server administration
#[derive(Parser)]
#[command(name = "policy-server")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "POLICY_SERVER_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "POLICY_SERVER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Create or update the database schema
    #[command(name = "migrate")]
    Migrate,

    /// Egress destination management
    #[command(name = "destinations")]
    Destinations {
        #[command(subcommand)]
        command: DestinationsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    if let Commands::Config { command } = command {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"))?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = PolicyServerConfig::load_or_default(cli.config).context("Failed to load configuration")?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level))?;

    let services = Services::connect(&config).await?;

    match command {
        Commands::Migrate => commands::migrate::execute(&services).await,
        Commands::Destinations { command } => commands::destinations::handle_command(command, &services).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
