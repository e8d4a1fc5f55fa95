//! The per-cycle indicator snapshot.

use serde::{Deserialize, Serialize};

use super::TrendDirection;

/// Latest Supertrend state on one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendReading {
    /// Active band: the lower band while up, the upper band while down
    pub value: f64,
    pub direction: TrendDirection,
    pub upper_band: f64,
    pub lower_band: f64,
}

impl SupertrendReading {
    /// A flat reading pinned to `price`.
    pub fn flat(price: f64) -> Self {
        Self {
            value: price,
            direction: TrendDirection::Up,
            upper_band: price,
            lower_band: price,
        }
    }
}

/// Latest Bollinger Band state, positioned against the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub width: f64,
    /// Where the price sits inside the band, clamped to [0, 1]
    pub position: f64,
}

impl BandReading {
    /// Build a reading from raw band values and the price being positioned.
    ///
    /// A collapsed band (zero range) puts the price at the midpoint, 0.5.
    pub fn from_bands(upper: f64, middle: f64, lower: f64, price: f64) -> Self {
        let range = upper - lower;
        let width = if middle > 0.0 { range / middle } else { 0.0 };
        let position = if range > 0.0 {
            ((price - lower) / range).clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self {
            upper,
            middle,
            lower,
            width,
            position,
        }
    }
}

/// How a snapshot field was filled when the latest value was missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FallbackSource {
    /// Nearest earlier valid value, `bars_back` bars before the latest
    Backfilled { bars_back: usize },
    /// The indicator's documented default
    Default,
}

/// One recorded fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    pub indicator: String,
    pub source: FallbackSource,
    pub value: f64,
}

/// Everything the regime classifier and strategies read in one cycle.
///
/// Rebuilt from scratch every cycle. Every numeric field is defined: missing
/// values are backfilled or defaulted, and each substitution is listed in
/// `fallbacks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Timestamp of the latest fast-timeframe bar, Unix ms
    pub timestamp: i64,
    pub current_price: f64,
    pub high: f64,
    pub low: f64,
    pub supertrend_fast: SupertrendReading,
    pub supertrend_slow: SupertrendReading,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub bollinger: BandReading,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub atr: f64,
    /// ATR as a fraction of the current price
    pub atr_percent: f64,
    pub fallbacks: Vec<Fallback>,
}

impl IndicatorSnapshot {
    /// A snapshot holding only defaults around `price`.
    pub fn neutral(price: f64, timestamp: i64) -> Self {
        let atr = price * 0.02;
        Self {
            timestamp,
            current_price: price,
            high: price,
            low: price,
            supertrend_fast: SupertrendReading::flat(price),
            supertrend_slow: SupertrendReading::flat(price),
            ema_fast: price,
            ema_slow: price,
            rsi: 50.0,
            bollinger: BandReading::from_bands(price, price, price, price),
            adx: 20.0,
            plus_di: 20.0,
            minus_di: 20.0,
            atr,
            atr_percent: 0.02,
            fallbacks: Vec::new(),
        }
    }

    /// +DI minus -DI.
    #[inline]
    pub fn di_spread(&self) -> f64 {
        self.plus_di - self.minus_di
    }

    /// Relative gap between the fast and slow EMA.
    pub fn ema_gap(&self) -> f64 {
        if self.ema_slow > 0.0 {
            (self.ema_fast - self.ema_slow) / self.ema_slow
        } else {
            0.0
        }
    }

    /// Whether the named field came from a fallback this cycle.
    pub fn used_fallback(&self, indicator: &str) -> bool {
        self.fallbacks.iter().any(|f| f.indicator == indicator)
    }
}
