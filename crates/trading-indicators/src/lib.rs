//! Technical indicators and the snapshot engine.
//!
//! This crate provides batch implementations of the indicators the regime
//! classifier and strategies read:
//! - Moving averages (EMA)
//! - Momentum (RSI)
//! - Volatility (ATR, Bollinger Bands)
//! - Trend (ADX with +DI/-DI, Supertrend)
//!
//! [`IndicatorEngine`] wires them to the fast and slow timeframes and turns the
//! latest values into an [`trading_core::IndicatorSnapshot`], applying the
//! missing-value policy in [`fallback`].

pub mod engine;
pub mod fallback;
pub mod momentum;
pub mod moving_average;
pub mod trend;
pub mod volatility;

pub use engine::{IndicatorConfig, IndicatorEngine};
pub use fallback::FallbackLog;
pub use momentum::Rsi;
pub use moving_average::Ema;
pub use trend::{Adx, AdxOutput, Supertrend};
pub use volatility::{Atr, BollingerBands, BollingerOutput};
