//! Volatility indicators.

use serde::{Deserialize, Serialize};
use trading_core::traits::{MultiOutputIndicator, OhlcIndicator};

use crate::momentum::wilder_smooth;

/// True range of every bar after the first.
pub(crate) fn true_ranges(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (1..close.len())
        .map(|i| {
            let high_low = high[i] - low[i];
            let high_close = (high[i] - close[i - 1]).abs();
            let low_close = (low[i] - close[i - 1]).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range (ATR), Wilder-smoothed.
///
/// The first output belongs to bar index `period`; the last output to the
/// last bar.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl OhlcIndicator for Atr {
    type Output = f64;

    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        if self.validate_ohlc(high, low, close).is_err() {
            return vec![];
        }
        wilder_smooth(&true_ranges(high, low, close), self.period)
    }

    fn warmup(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub bandwidth: f64,
    /// (price - lower) / (upper - lower), unclamped
    pub percent_b: f64,
}

impl BollingerOutput {
    pub fn is_finite(&self) -> bool {
        self.upper.is_finite() && self.middle.is_finite() && self.lower.is_finite()
    }
}

/// Bollinger Bands over a population standard deviation.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(std_dev_multiplier > 0.0, "Std dev multiplier must be positive");
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;

        data.windows(self.period)
            .map(|window| {
                let mean: f64 = window.iter().sum::<f64>() / period_f64;
                let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f64;
                let std_dev = variance.sqrt();

                let upper = mean + self.std_dev_multiplier * std_dev;
                let lower = mean - self.std_dev_multiplier * std_dev;
                let bandwidth = if mean != 0.0 { (upper - lower) / mean } else { 0.0 };

                let price = window[self.period - 1];
                let percent_b = if upper != lower {
                    (price - lower) / (upper - lower)
                } else {
                    0.5
                };

                BollingerOutput {
                    upper,
                    middle: mean,
                    lower,
                    bandwidth,
                    percent_b,
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}
