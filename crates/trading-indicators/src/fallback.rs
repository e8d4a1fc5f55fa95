//! Missing-value policy for snapshot fields.
//!
//! The latest value of an indicator series is used when it is finite.
//! Otherwise the nearest earlier finite value is backfilled, and when the
//! series has none the indicator's default is substituted. Every substitution
//! is logged and recorded so callers can see which fields were not live.

use tracing::{debug, warn};
use trading_core::{Fallback, FallbackSource};

/// Collects the fallbacks applied while building one snapshot.
#[derive(Debug, Default)]
pub struct FallbackLog {
    entries: Vec<Fallback>,
}

impl FallbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest finite value of `values`, or a backfill, or `default`.
    pub fn latest(&mut self, indicator: &str, values: &[f64], default: f64) -> f64 {
        self.latest_by(indicator, values, |v| v.is_finite(), |v| *v, default)
    }

    /// Generic form of [`latest`](Self::latest) for multi-field outputs.
    ///
    /// `value_of` picks the number recorded in the log entry.
    pub fn latest_by<T: Copy>(
        &mut self,
        indicator: &str,
        values: &[T],
        is_valid: impl Fn(&T) -> bool,
        value_of: impl Fn(&T) -> f64,
        default: T,
    ) -> T {
        match values.iter().rev().position(&is_valid) {
            Some(0) => values[values.len() - 1],
            Some(bars_back) => {
                let value = values[values.len() - 1 - bars_back];
                debug!(indicator, bars_back, value = value_of(&value), "Backfilled missing indicator value");
                self.entries.push(Fallback {
                    indicator: indicator.to_string(),
                    source: FallbackSource::Backfilled { bars_back },
                    value: value_of(&value),
                });
                value
            }
            None => {
                warn!(indicator, value = value_of(&default), "No valid indicator value, using default");
                self.entries.push(Fallback {
                    indicator: indicator.to_string(),
                    source: FallbackSource::Default,
                    value: value_of(&default),
                });
                default
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Fallback> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_valid_value_is_used_silently() {
        let mut log = FallbackLog::new();
        assert_eq!(log.latest("rsi", &[40.0, 45.0], 50.0), 45.0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_backfill_scans_to_nearest_valid() {
        let mut log = FallbackLog::new();
        let value = log.latest("adx", &[18.0, 22.0, f64::NAN, f64::NAN], 20.0);

        assert_eq!(value, 22.0);
        let entries = log.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, FallbackSource::Backfilled { bars_back: 2 });
    }

    #[test]
    fn test_default_when_nothing_valid() {
        let mut log = FallbackLog::new();
        assert_eq!(log.latest("rsi", &[f64::NAN], 50.0), 50.0);
        assert_eq!(log.latest("ema_fast", &[], 101.5), 101.5);

        let entries = log.into_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.source == FallbackSource::Default));
        assert_eq!(entries[1].indicator, "ema_fast");
    }

    #[test]
    fn test_latest_by_uses_custom_validity() {
        let mut log = FallbackLog::new();
        let pairs: [(f64, f64); 2] = [(1.0, 2.0), (3.0, f64::NAN)];
        let value = log.latest_by(
            "pair",
            &pairs,
            |p| p.0.is_finite() && p.1.is_finite(),
            |p| p.0,
            (0.0, 0.0),
        );
        assert_eq!(value, (1.0, 2.0));
    }
}
