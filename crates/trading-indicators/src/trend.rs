//! Trend indicators: ADX with directional indices, and the Supertrend tracker.

use serde::{Deserialize, Serialize};
use trading_core::traits::OhlcIndicator;
use trading_core::{SupertrendReading, TrendDirection};

use crate::momentum::wilder_smooth;
use crate::volatility::{true_ranges, Atr};

/// ADX output for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxOutput {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Average Directional Index with +DI / -DI.
///
/// Directional movement and true range are Wilder-summed over `period`
/// bars, DX is averaged over another `period` DX values, so the first
/// output lands on bar index `2 * period - 1`.
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Running Wilder sum: seed with the plain sum, then `s - s / n + v`.
    fn wilder_sum(values: &[f64], period: usize) -> Vec<f64> {
        if values.len() < period {
            return vec![];
        }
        let period_f64 = period as f64;
        let mut sum: f64 = values[..period].iter().sum();
        let mut result = Vec::with_capacity(values.len() - period + 1);
        result.push(sum);
        for &value in &values[period..] {
            sum = sum - sum / period_f64 + value;
            result.push(sum);
        }
        result
    }
}

impl OhlcIndicator for Adx {
    type Output = AdxOutput;

    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<AdxOutput> {
        if self.validate_ohlc(high, low, close).is_err() {
            return vec![];
        }

        let (plus_dm, minus_dm): (Vec<f64>, Vec<f64>) = (1..close.len())
            .map(|i| {
                let up = high[i] - high[i - 1];
                let down = low[i - 1] - low[i];
                let plus = if up > down && up > 0.0 { up } else { 0.0 };
                let minus = if down > up && down > 0.0 { down } else { 0.0 };
                (plus, minus)
            })
            .unzip();

        let tr = Self::wilder_sum(&true_ranges(high, low, close), self.period);
        let plus = Self::wilder_sum(&plus_dm, self.period);
        let minus = Self::wilder_sum(&minus_dm, self.period);

        let directional: Vec<(f64, f64, f64)> = tr
            .iter()
            .zip(plus.iter().zip(minus.iter()))
            .map(|(&tr, (&p, &m))| {
                let (plus_di, minus_di) = if tr > 0.0 {
                    (100.0 * p / tr, 100.0 * m / tr)
                } else {
                    (0.0, 0.0)
                };
                let di_sum = plus_di + minus_di;
                let dx = if di_sum > 0.0 {
                    100.0 * (plus_di - minus_di).abs() / di_sum
                } else {
                    0.0
                };
                (plus_di, minus_di, dx)
            })
            .collect();

        let dx: Vec<f64> = directional.iter().map(|d| d.2).collect();
        let adx = wilder_smooth(&dx, self.period);
        let offset = directional.len() - adx.len();

        adx.iter()
            .zip(&directional[offset..])
            .map(|(&adx, &(plus_di, minus_di, _))| AdxOutput {
                adx,
                plus_di,
                minus_di,
            })
            .collect()
    }

    fn warmup(&self) -> usize {
        2 * self.period
    }

    fn name(&self) -> &str {
        "ADX"
    }
}

/// Supertrend: an ATR band around the bar midpoint that ratchets in the
/// direction of the trend and flips when price closes through it.
///
/// The final upper band never rises while price stays below it, and the
/// final lower band never falls while price stays above it. Each bar flips
/// the direction at most once.
#[derive(Debug, Clone)]
pub struct Supertrend {
    atr: Atr,
    multiplier: f64,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "Multiplier must be positive");
        Self {
            atr: Atr::new(period),
            multiplier,
        }
    }
}

impl OhlcIndicator for Supertrend {
    type Output = SupertrendReading;

    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<SupertrendReading> {
        let atr = self.atr.calculate(high, low, close);
        if atr.is_empty() {
            return vec![];
        }
        let offset = close.len() - atr.len();

        let mut result: Vec<SupertrendReading> = Vec::with_capacity(atr.len());

        for (k, &atr_value) in atr.iter().enumerate() {
            let i = offset + k;
            let mid = (high[i] + low[i]) / 2.0;
            let basic_upper = mid + self.multiplier * atr_value;
            let basic_lower = mid - self.multiplier * atr_value;

            let (upper_band, lower_band, direction) = match result.last() {
                None => (basic_upper, basic_lower, TrendDirection::Up),
                Some(prev) => {
                    let prev_close = close[i - 1];
                    let upper = if basic_upper < prev.upper_band || prev_close > prev.upper_band {
                        basic_upper
                    } else {
                        prev.upper_band
                    };
                    let lower = if basic_lower > prev.lower_band || prev_close < prev.lower_band {
                        basic_lower
                    } else {
                        prev.lower_band
                    };
                    let direction = match prev.direction {
                        TrendDirection::Up if close[i] < lower => TrendDirection::Down,
                        TrendDirection::Down if close[i] > upper => TrendDirection::Up,
                        unchanged => unchanged,
                    };
                    (upper, lower, direction)
                }
            };

            let value = match direction {
                TrendDirection::Up => lower_band,
                TrendDirection::Down => upper_band,
            };

            result.push(SupertrendReading {
                value,
                direction,
                upper_band,
                lower_band,
            });
        }

        result
    }

    fn warmup(&self) -> usize {
        self.atr.warmup()
    }

    fn name(&self) -> &str {
        "Supertrend"
    }
}
