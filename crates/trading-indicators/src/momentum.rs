//! Momentum indicators.

use trading_core::traits::Indicator;

/// Wilder's smoothing: seed with the mean of the first `period` values, then
/// `avg = (prev_avg * (period - 1) + value) / period`.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(values.len() - period + 1);
    let period_f64 = period as f64;

    let mut avg: f64 = values[..period].iter().sum::<f64>() / period_f64;
    result.push(avg);

    for &value in &values[period..] {
        avg = (avg * (period_f64 - 1.0) + value) / period_f64;
        result.push(avg);
    }

    result
}

/// Relative Strength Index (RSI), Wilder-smoothed.
///
/// Reads above 70 / below 30 are the conventional overbought / oversold
/// levels; the mean-reversion entries use the stricter 75 / 25.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let avg_gains = wilder_smooth(&gains, self.period);
        let avg_losses = wilder_smooth(&losses, self.period);

        avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if loss == 0.0 {
                    if gain == 0.0 {
                        50.0
                    } else {
                        100.0
                    }
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}
