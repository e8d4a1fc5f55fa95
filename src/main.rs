//! Regime-trader CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_config;
use trading_monitor::{setup_logging, LoggingOverrides};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::DefaultConfig = cli.command {
        return cli::commands::default_config::run();
    }

    let config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load default configuration".to_string(),
    })?;

    let overrides = LoggingOverrides {
        level: cli.log_level.map(|level| level.as_str().to_string()),
        json: cli.json_logs,
    };
    // Held until exit so the file writer flushes
    let _guard = setup_logging(&config.logging, &overrides).context("Failed to set up logging")?;

    match cli.command {
        Commands::Evaluate(args) => cli::commands::evaluate::run(args, config).await,
        Commands::Strategies(args) => cli::commands::strategies::run(args, &config),
        Commands::ValidateConfig => cli::commands::validate::run(cli.config.as_deref(), &config),
        Commands::DefaultConfig => cli::commands::default_config::run(),
    }
}
