//! Logging setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Directory for a daily-rolling log file
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "regime-trader.log".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), LoggingError> {
        EnvFilter::try_new(&self.level).map_err(|e| LoggingError::Filter(e.to_string()))?;
        if self.directory.is_some() && self.file_prefix.trim().is_empty() {
            return Err(LoggingError::Filter("logging.file_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Command-line overrides applied on top of [`LoggingConfig`].
#[derive(Debug, Clone, Default)]
pub struct LoggingOverrides {
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Cannot create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    Init(String),
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over both the configured and the overridden level. The
/// returned guard flushes the file writer and must be held until exit.
pub fn setup_logging(
    config: &LoggingConfig,
    overrides: &LoggingOverrides,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let level = overrides.level.as_deref().unwrap_or(&config.level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::Filter(e.to_string()))?,
    };
    let format = if overrides.json { LogFormat::Json } else { config.format };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![console_layer(format)];

    let guard = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|source| LoggingError::Directory {
                path: directory.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

fn console_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parses_lowercase() {
        let config: LoggingConfig = toml::from_str("format = \"json\"\nlevel = \"debug\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_filter() {
        let config = LoggingConfig {
            level: "trading=notalevel".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(LoggingConfig::default().validate().is_ok());
    }
}
