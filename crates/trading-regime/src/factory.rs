//! Per-symbol classifier factory.

use trading_core::TradingError;

use crate::classifier::{RegimeClassifier, RegimeConfig};

/// Hands out one independent classifier per symbol, all sharing a config.
#[derive(Debug, Clone)]
pub struct RegimeClassifierFactory {
    config: RegimeConfig,
}

impl RegimeClassifierFactory {
    pub fn new(config: RegimeConfig) -> Result<Self, TradingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// A fresh classifier for `symbol` with no history.
    pub fn create(&self, symbol: &str) -> RegimeClassifier {
        RegimeClassifier::new(symbol, self.config.clone())
    }
}

impl Default for RegimeClassifierFactory {
    fn default() -> Self {
        Self {
            config: RegimeConfig::default(),
        }
    }
}
