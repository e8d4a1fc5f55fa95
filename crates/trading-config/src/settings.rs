//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_core::traits::StrategyConfig;
use trading_core::Timeframe;
use trading_indicators::IndicatorConfig;
use trading_monitor::LoggingConfig;
use trading_regime::RegimeConfig;
use trading_risk::{RiskConfig, SizingConfig, StopValidationConfig};
use trading_strategies::{MeanReversionConfig, TrendFollowingConfig};

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub timeframes: TimeframeSettings,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub stops: StopValidationConfig,
    #[serde(default)]
    pub trend_following: TrendFollowingConfig,
    #[serde(default)]
    pub mean_reversion: MeanReversionConfig,
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
    pub symbols: Vec<String>,
    /// Directory holding `{symbol}_{timeframe}.csv` bar files
    pub data_dir: PathBuf,
    /// Account equity the risk manager starts from
    pub initial_equity: Decimal,
}

impl Default for AppSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            name: "regime-trader".to_string(),
            environment: "development".to_string(),
            symbols: vec!["BTCUSDT".to_string()],
            data_dir: PathBuf::from("data"),
            initial_equity: dec!(1000),
        }
    }
}

/// The two bar timeframes a snapshot is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeframeSettings {
    pub fast: Timeframe,
    pub slow: Timeframe,
    /// Bars kept per timeframe
    pub candle_count: usize,
}

impl Default for TimeframeSettings {
    fn default() -> Self {
        Self {
            fast: Timeframe::Minute5,
            slow: Timeframe::Minute15,
            candle_count: 100,
        }
    }
}

impl AppConfig {
    /// Check every section and the constraints that span sections.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |section: &str, err: &dyn std::fmt::Display| SettingsError::Invalid(format!("{}: {}", section, err));

        if self.app.symbols.is_empty() || self.app.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(SettingsError::Invalid("app: symbols must be a non-empty list of names".into()));
        }
        if self.app.initial_equity <= Decimal::ZERO {
            return Err(SettingsError::Invalid(format!(
                "app: initial_equity must be positive, got {}",
                self.app.initial_equity
            )));
        }

        self.logging.validate().map_err(|e| invalid("logging", &e))?;
        self.indicators.validate().map_err(|e| invalid("indicators", &e))?;
        self.regime.validate().map_err(|e| invalid("regime", &e))?;
        self.risk.validate().map_err(|e| invalid("risk", &e))?;
        self.sizing.validate().map_err(|e| invalid("sizing", &e))?;
        self.stops.validate().map_err(|e| invalid("stops", &e))?;
        self.trend_following.validate().map_err(|e| invalid("trend_following", &e))?;
        self.mean_reversion.validate().map_err(|e| invalid("mean_reversion", &e))?;

        let timeframes = &self.timeframes;
        if timeframes.fast >= timeframes.slow {
            return Err(SettingsError::Invalid(format!(
                "timeframes: fast ({}) must be shorter than slow ({})",
                timeframes.fast, timeframes.slow
            )));
        }
        let required = self.indicators.min_bars();
        if timeframes.candle_count < required {
            return Err(SettingsError::Invalid(format!(
                "timeframes: candle_count ({}) is below the {} bars the indicators need",
                timeframes.candle_count, required
            )));
        }
        Ok(())
    }

    /// The configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
