//! Configuration management.
//!
//! Sources, later ones winning: built-in defaults, the TOML file, then
//! `TRADING__SECTION__KEY` environment variables.

mod settings;

pub use settings::{AppConfig, AppSettings, TimeframeSettings};

use config::{Config, ConfigError, Environment, File};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load and validate configuration from an optional file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    load_with_env(path, None)
}

fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("app.symbols")
                .try_parsing(true)
                .source(env),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;
    use trading_core::Timeframe;
    use trading_monitor::LogFormat;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("regime-trader-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = load_with_env(None, Some(HashMap::new())).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.timeframes.fast, Timeframe::Minute5);
        assert_eq!(config.timeframes.candle_count, 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_temp(
            "file",
            r#"
[app]
symbols = ["ETHUSDT", "SOLUSDT"]

[logging]
format = "compact"

[risk.limits]
max_daily_loss = 0.04

[mean_reversion]
rsi_oversold = 20.0
"#,
        );
        let config = load_with_env(Some(&path), Some(HashMap::new())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.app.symbols, vec!["ETHUSDT", "SOLUSDT"]);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.risk.limits.max_daily_loss, dec!(0.04));
        assert!((config.mean_reversion.rsi_oversold - 20.0).abs() < 1e-10);
        // Untouched keys keep their defaults
        assert_eq!(config.risk.limits.max_drawdown, dec!(0.15));
        assert!((config.mean_reversion.rsi_overbought - 75.0).abs() < 1e-10);
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_temp("env", "[timeframes]\ncandle_count = 150\n");
        let env = HashMap::from([
            ("TRADING__TIMEFRAMES__CANDLE_COUNT".to_string(), "200".to_string()),
            ("TRADING__APP__SYMBOLS".to_string(), "BTCUSDT,ETHUSDT".to_string()),
        ]);
        let config = load_with_env(Some(&path), Some(env)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.timeframes.candle_count, 200);
        assert_eq!(config.app.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/regime-trader.toml");
        assert!(matches!(
            load_with_env(Some(path), Some(HashMap::new())),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn test_cross_section_validation() {
        let mut config = AppConfig::default();
        config.timeframes.fast = Timeframe::Hour1;
        assert!(matches!(config.validate(), Err(SettingsError::Invalid(msg)) if msg.starts_with("timeframes")));

        let mut config = AppConfig::default();
        config.timeframes.candle_count = 40;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.indicators.ema_fast_period = 60;
        assert!(matches!(config.validate(), Err(SettingsError::Invalid(msg)) if msg.starts_with("indicators")));

        let mut config = AppConfig::default();
        config.app.symbols.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml"));
        let config = load_with_env(Some(path), Some(HashMap::new())).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.app.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.indicators, defaults.indicators);
        assert_eq!(config.regime, defaults.regime);
        assert_eq!(config.risk, defaults.risk);
        assert_eq!(config.sizing, defaults.sizing);
        assert_eq!(config.trend_following, defaults.trend_following);
        assert_eq!(config.mean_reversion, defaults.mean_reversion);
    }

    #[test]
    fn test_printed_defaults_load_back() {
        let printed = AppConfig::default().to_toml().unwrap();
        let path = write_temp("printed", &printed);
        let config = load_with_env(Some(&path), Some(HashMap::new())).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config, AppConfig::default());
    }
}
