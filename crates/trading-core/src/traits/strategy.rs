//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{
    Direction, ExitReason, IndicatorSnapshot, PositionContext, RegimeState, Signal, StopTarget,
    StrategyKind,
};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// A regime-specific signal generator.
///
/// Strategies are stateless between cycles: everything they read arrives in
/// the snapshot, the regime state and the position context, so one instance
/// can serve every symbol.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Get the unique name of this strategy.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    fn description(&self) -> &str {
        ""
    }

    /// Whether this strategy should run under `regime`.
    fn is_applicable(&self, regime: &RegimeState) -> bool;

    /// Evaluate entry conditions.
    ///
    /// Returns `None` when no entry is warranted, including when the computed
    /// stop or risk-reward falls outside the strategy's bounds.
    fn check_entry(&self, snapshot: &IndicatorSnapshot, regime: &RegimeState) -> Option<Signal>;

    /// Evaluate exit conditions for a position this strategy opened.
    fn check_exit(&self, snapshot: &IndicatorSnapshot, position: &PositionContext) -> Option<ExitReason>;

    /// Stop-loss and take-profit for an entry at `entry_price`.
    fn calculate_stops(&self, snapshot: &IndicatorSnapshot, direction: Direction, entry_price: f64) -> StopTarget;

    /// Evaluation cycles after which a position is force-closed, if any.
    fn max_holding_cycles(&self) -> Option<u32> {
        None
    }
}
