//! OHLCV (Open, High, Low, Close, Volume) data types.

use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::error::DataError;

/// One candle. Prices are f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Candle open time, Unix milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Rolling window of bars for one symbol and timeframe.
///
/// Bars are kept strictly ascending by timestamp. Pushing a bar with the same
/// timestamp as the last one replaces it, which is how a still-forming candle
/// gets refreshed.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
    /// Maximum number of bars retained (0 = unlimited)
    capacity: usize,
}

impl BarSeries {
    /// Create a new empty bar series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self::with_capacity(symbol, timeframe, 0)
    }

    /// Create a bar series that drops its oldest bar once `capacity` is reached.
    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a bar, replacing the last one when the timestamps match.
    pub fn push(&mut self, bar: Bar) -> Result<(), DataError> {
        if let Some(last) = self.bars.last_mut() {
            if bar.timestamp == last.timestamp {
                *last = bar;
                return Ok(());
            }
            if bar.timestamp < last.timestamp {
                return Err(DataError::OutOfOrder {
                    timestamp: bar.timestamp,
                    last: last.timestamp,
                });
            }
        }
        if self.capacity > 0 && self.bars.len() >= self.capacity {
            self.bars.remove(0);
        }
        self.bars.push(bar);
        Ok(())
    }

    /// Push multiple bars, stopping at the first out-of-order one.
    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) -> Result<(), DataError> {
        for bar in bars {
            self.push(bar)?;
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// All bars, oldest first.
    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_series_capacity() {
        let mut series = BarSeries::with_capacity("BTC", Timeframe::Minute5, 3);

        for ts in 1..=3 {
            series.push(Bar::new(ts, 100.0, 101.0, 99.0, 100.5, 1000.0)).unwrap();
        }
        assert_eq!(series.len(), 3);

        series.push(Bar::new(4, 102.5, 104.0, 102.0, 103.5, 1000.0)).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.as_slice()[0].timestamp, 2);
        assert_eq!(series.last().map(|b| b.timestamp), Some(4));
    }

    #[test]
    fn test_bar_series_replaces_forming_candle() {
        let mut series = BarSeries::new("BTC", Timeframe::Minute5);
        series.push(Bar::new(1, 100.0, 101.0, 99.0, 100.5, 1000.0)).unwrap();
        series.push(Bar::new(1, 100.0, 103.0, 99.0, 102.0, 1500.0)).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.last().map(|b| b.close), Some(102.0));
    }

    #[test]
    fn test_bar_series_rejects_older_bar() {
        let mut series = BarSeries::new("BTC", Timeframe::Minute5);
        series.push(Bar::new(10, 100.0, 101.0, 99.0, 100.5, 1000.0)).unwrap();

        let err = series.push(Bar::new(5, 100.0, 101.0, 99.0, 100.5, 1000.0));
        assert!(matches!(err, Err(DataError::OutOfOrder { timestamp: 5, last: 10 })));
        assert_eq!(series.len(), 1);
    }
}
