//! Classified market regime for one cycle.

use serde::{Deserialize, Serialize};

use super::MarketRegime;

/// Result of one regime classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub regime: MarketRegime,
    pub adx: f64,
    pub atr_percent: f64,
    pub bb_width: f64,
    pub bb_position: f64,
    /// In [0, 1]; always 0 for an unknown regime
    pub confidence: f64,
    /// Consecutive classifications that produced this label, at least 1
    pub stability: u32,
    pub description: String,
}

impl RegimeState {
    /// An unknown regime with no drivers, used before the first classification.
    pub fn unknown() -> Self {
        Self {
            regime: MarketRegime::Unknown,
            adx: 0.0,
            atr_percent: 0.0,
            bb_width: 0.0,
            bb_position: 0.5,
            confidence: 0.0,
            stability: 0,
            description: String::from("no classification yet"),
        }
    }

    pub fn is_trending(&self) -> bool {
        self.regime == MarketRegime::Trending
    }

    pub fn is_ranging(&self) -> bool {
        self.regime == MarketRegime::Ranging
    }
}
