//! Error types for the trading decision core.
//!
//! Only genuinely exceptional conditions are errors. Ineligibility, rejected
//! stops and zero-size positions are ordinary values returned by the risk layer.

use thiserror::Error;

use crate::types::Timeframe;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Bar series errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Bar at {timestamp} is older than the last bar at {last}")]
    OutOfOrder { timestamp: i64, last: i64 },

    #[error("No bars available for {symbol} on {timeframe}")]
    NoDataAvailable { symbol: String, timeframe: Timeframe },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Not enough bars on one of the snapshot timeframes. The caller should
    /// skip the cycle and retry once more history is available.
    #[error("Insufficient {timeframe} bars: need {required}, have {available}")]
    InsufficientBars {
        timeframe: Timeframe,
        required: usize,
        available: usize,
    },

    /// The latest close is NaN, infinite or not positive.
    #[error("Invalid price: {price}")]
    InvalidPrice { price: f64 },

    #[error("{timeframe} bars are not strictly ascending at index {index}")]
    UnorderedBars { timeframe: Timeframe, index: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl IndicatorError {
    /// Whether the cycle can simply be skipped and retried later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IndicatorError::InsufficientData { .. } | IndicatorError::InsufficientBars { .. }
        )
    }
}
