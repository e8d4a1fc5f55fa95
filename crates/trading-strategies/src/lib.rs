//! Regime-specific signal generators.
//!
//! - [`TrendFollowingStrategy`] for trending regimes
//! - [`MeanReversionStrategy`] for ranging regimes
//!
//! [`StrategySet`] holds one of each and picks by regime. Both strategies
//! describe their entry rule as a checklist, reported through
//! [`SignalReadiness`].

mod exits;
mod mean_reversion;
mod readiness;
mod registry;
mod trend_following;

pub use exits::ProfitLock;
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use readiness::{best_opportunity, ConditionResult, SignalReadiness};
pub use registry::{StrategyInfo, StrategySet};
pub use trend_following::{TrendFollowingConfig, TrendFollowingStrategy};
