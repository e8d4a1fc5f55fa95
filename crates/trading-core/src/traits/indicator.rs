//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Batch indicator over a single price series.
///
/// Output vectors contain only valid values, aligned to the end of the
/// input: the last output corresponds to the last input.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Multi-output indicator (e.g., Bollinger Bands).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Indicator that needs the high/low/close of each bar (ATR, ADX, Supertrend).
pub trait OhlcIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values from equal-length high, low and close slices.
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Self::Output>;

    /// Minimum number of bars before the first output.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate slice lengths and that there is at least one output's worth of bars.
    fn validate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Result<(), IndicatorError> {
        if high.len() != close.len() || low.len() != close.len() {
            return Err(IndicatorError::InvalidParameter(format!(
                "{}: high/low/close lengths differ ({}/{}/{})",
                self.name(),
                high.len(),
                low.len(),
                close.len()
            )));
        }
        if close.len() < self.warmup() {
            return Err(IndicatorError::InsufficientData {
                required: self.warmup(),
                available: close.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WindowSum {
        period: usize,
    }

    impl Indicator for WindowSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "window_sum"
        }
    }

    struct BarRange;

    impl OhlcIndicator for BarRange {
        type Output = f64;

        fn calculate(&self, high: &[f64], low: &[f64], _close: &[f64]) -> Vec<f64> {
            high.iter().zip(low).map(|(h, l)| h - l).collect()
        }

        fn warmup(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "bar_range"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = WindowSum { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_indicator_calculate() {
        let indicator = WindowSum { period: 3 };
        let result = indicator.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        assert!((result[2] - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_ohlc_validation() {
        let indicator = BarRange;
        assert!(matches!(
            indicator.validate_ohlc(&[2.0, 3.0], &[1.0], &[1.5, 2.5]),
            Err(IndicatorError::InvalidParameter(_))
        ));
        assert!(matches!(
            indicator.validate_ohlc(&[2.0], &[1.0], &[1.5]),
            Err(IndicatorError::InsufficientData { required: 2, available: 1 })
        ));
        assert!(indicator.validate_ohlc(&[2.0, 3.0], &[1.0, 2.0], &[1.5, 2.5]).is_ok());
    }
}
