//! CLI definitions.

pub mod bars;
pub mod commands;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regime-trader")]
#[command(author, version, about = "Regime-aware signal, sizing and risk decisions for perpetual futures")]
pub struct Cli {
    /// Configuration file path; built-in defaults when omitted
    #[arg(short, long, env = "TRADING_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one evaluation cycle per symbol over CSV bars
    Evaluate(EvaluateArgs),
    /// List the configured strategies
    Strategies(StrategiesArgs),
    /// Validate configuration
    ValidateConfig,
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(clap::Args)]
pub struct EvaluateArgs {
    /// Symbols to evaluate (comma-separated); the configured list when omitted
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Directory holding {symbol}_{timeframe}.csv files
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Account equity; the configured initial equity when omitted
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Available balance; equal to equity when omitted
    #[arg(long)]
    pub available: Option<Decimal>,

    /// Evaluation time (RFC 3339); now when omitted
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    /// Also print every strategy's entry checklist
    #[arg(long)]
    pub readiness: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct StrategiesArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}
