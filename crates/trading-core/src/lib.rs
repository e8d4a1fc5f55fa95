//! Core types and traits for the trading decision core.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - The per-cycle indicator snapshot and regime state
//! - Signals, stop/target pairs and exit reasons
//! - Core traits for strategies and indicators

pub mod types;
pub mod traits;
pub mod error;

pub use error::TradingError;
pub use types::*;
pub use traits::*;
