//! Core data types for the trading decision core.

mod market;
mod ohlcv;
mod regime;
mod signal;
mod snapshot;
mod timeframe;

pub use market::{Direction, MarketRegime, StrategyKind, TrendDirection};
pub use ohlcv::{Bar, BarSeries};
pub use regime::RegimeState;
pub use signal::{ExitReason, PositionContext, Signal, StopTarget};
pub use snapshot::{BandReading, Fallback, FallbackSource, IndicatorSnapshot, SupertrendReading};
pub use timeframe::Timeframe;
