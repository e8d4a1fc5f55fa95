//! ADX / ATR based regime classifier.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::{IndicatorSnapshot, MarketRegime, RegimeState, TradingError};

/// Classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// ADX above this is trending, below it ranging
    pub adx_threshold: f64,
    /// ADX at which trending confidence from ADX saturates
    pub adx_strong: f64,
    /// ATR fraction above this alone is enough for trending
    pub atr_trending_threshold: f64,
    /// ATR fraction at which trending confidence from ATR saturates
    pub atr_high: f64,
    /// ATR fraction below this is reported as quiet in the description
    pub atr_ranging_threshold: f64,
    /// Consecutive classifications before a regime counts as stable
    pub min_stable_count: u32,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            adx_threshold: 25.0,
            adx_strong: 50.0,
            atr_trending_threshold: 0.02,
            atr_high: 0.05,
            atr_ranging_threshold: 0.015,
            min_stable_count: 3,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), TradingError> {
        if !(self.adx_threshold > 0.0 && self.adx_strong > self.adx_threshold) {
            return Err(TradingError::Config(format!(
                "regime: adx_strong ({}) must exceed adx_threshold ({}) > 0",
                self.adx_strong, self.adx_threshold
            )));
        }
        if !(self.atr_trending_threshold > 0.0 && self.atr_high > self.atr_trending_threshold) {
            return Err(TradingError::Config(format!(
                "regime: atr_high ({}) must exceed atr_trending_threshold ({}) > 0",
                self.atr_high, self.atr_trending_threshold
            )));
        }
        if self.min_stable_count == 0 {
            return Err(TradingError::Config("regime: min_stable_count must be at least 1".into()));
        }
        Ok(())
    }
}

/// Classifies one symbol's snapshots and tracks how long the label has held.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    symbol: String,
    config: RegimeConfig,
    current: Option<RegimeState>,
}

impl RegimeClassifier {
    pub fn new(symbol: impl Into<String>, config: RegimeConfig) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            current: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Classify the snapshot and update the stability count.
    ///
    /// trending = ADX above threshold or ATR fraction above threshold;
    /// ranging = ADX below threshold. Exactly one of the two gives that
    /// label, anything else (including both) is unknown.
    pub fn classify(&mut self, snapshot: &IndicatorSnapshot) -> RegimeState {
        let cfg = &self.config;
        let adx = snapshot.adx;
        let atr_percent = snapshot.atr_percent;
        let bb = snapshot.bollinger;

        let trending = adx > cfg.adx_threshold || atr_percent > cfg.atr_trending_threshold;
        let ranging = adx < cfg.adx_threshold;

        let regime = match (trending, ranging) {
            (true, false) => MarketRegime::Trending,
            (false, true) => MarketRegime::Ranging,
            _ => MarketRegime::Unknown,
        };

        let confidence = match regime {
            MarketRegime::Trending => self.trending_confidence(adx, atr_percent),
            MarketRegime::Ranging => self.ranging_confidence(adx, bb.position),
            MarketRegime::Unknown => 0.0,
        };

        let stability = match &self.current {
            Some(prev) if prev.regime == regime => prev.stability.saturating_add(1),
            Some(prev) => {
                info!(
                    symbol = %self.symbol,
                    from = %prev.regime,
                    to = %regime,
                    after = prev.stability,
                    "Regime changed"
                );
                1
            }
            None => 1,
        };

        let state = RegimeState {
            regime,
            adx,
            atr_percent,
            bb_width: bb.width,
            bb_position: bb.position,
            confidence,
            stability,
            description: self.describe(regime, adx, atr_percent, bb.width),
        };

        debug!(
            symbol = %self.symbol,
            regime = %state.regime,
            confidence = state.confidence,
            stability = state.stability,
            "Regime classified"
        );

        self.current = Some(state.clone());
        state
    }

    fn trending_confidence(&self, adx: f64, atr_percent: f64) -> f64 {
        let cfg = &self.config;
        let adx_score = ((adx - cfg.adx_threshold) / (cfg.adx_strong - cfg.adx_threshold)).min(1.0);
        let atr_score = ((atr_percent - cfg.atr_trending_threshold)
            / (cfg.atr_high - cfg.atr_trending_threshold))
            .min(1.0);
        (0.6 * adx_score + 0.4 * atr_score).clamp(0.0, 1.0)
    }

    fn ranging_confidence(&self, adx: f64, bb_position: f64) -> f64 {
        let t = self.config.adx_threshold;
        let adx_score = ((t - adx) / t).max(0.0);
        let centered = 1.0 - (bb_position - 0.5).abs() * 2.0;
        (0.5 * adx_score + 0.5 * centered).clamp(0.0, 1.0)
    }

    fn describe(&self, regime: MarketRegime, adx: f64, atr_percent: f64, bb_width: f64) -> String {
        let volatility = if atr_percent > self.config.atr_trending_threshold {
            "high"
        } else if atr_percent < self.config.atr_ranging_threshold {
            "quiet"
        } else {
            "normal"
        };
        format!(
            "{}: ADX {:.1} (threshold {:.0}), ATR {:.2}% ({} volatility), band width {:.2}%",
            regime,
            adx,
            self.config.adx_threshold,
            atr_percent * 100.0,
            volatility,
            bb_width * 100.0
        )
    }

    /// The last classification, if any.
    pub fn current(&self) -> Option<&RegimeState> {
        self.current.as_ref()
    }

    /// Whether the current label has held for at least `min_count` classifications.
    pub fn is_stable(&self, min_count: u32) -> bool {
        self.regime_duration() >= min_count
    }

    /// [`is_stable`](Self::is_stable) with the configured minimum.
    pub fn is_stable_default(&self) -> bool {
        self.is_stable(self.config.min_stable_count)
    }

    /// Consecutive classifications with the current label.
    pub fn regime_duration(&self) -> u32 {
        self.current.as_ref().map_or(0, |s| s.stability)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
