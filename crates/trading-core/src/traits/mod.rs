//! Core traits for the trading decision core.

mod indicator;
mod strategy;

pub use indicator::{Indicator, MultiOutputIndicator, OhlcIndicator};
pub use strategy::{Strategy, StrategyConfig};
