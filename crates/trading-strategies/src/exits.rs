//! Exit rules shared by the strategies.

use serde::{Deserialize, Serialize};
use trading_core::{Direction, ExitReason, PositionContext};

/// Once the peak P&L fraction passes `trigger`, exit when the current P&L
/// drops to `retain` times the peak or less.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitLock {
    pub trigger: f64,
    pub retain: f64,
}

impl ProfitLock {
    pub const fn new(trigger: f64, retain: f64) -> Self {
        Self { trigger, retain }
    }

    pub fn check(&self, position: &PositionContext) -> Option<ExitReason> {
        let peak = position.peak_pnl_fraction;
        let pnl = position.pnl_fraction;
        (peak > self.trigger && pnl <= peak * self.retain).then_some(ExitReason::ProfitLock { peak_pnl: peak, pnl })
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), String> {
        if !(self.trigger > 0.0 && (0.0..1.0).contains(&self.retain)) {
            return Err(format!(
                "{}: trigger ({}) must be positive and retain ({}) in [0, 1)",
                name, self.trigger, self.retain
            ));
        }
        Ok(())
    }
}

/// Stop-loss or take-profit touched at `price`.
pub(crate) fn stop_or_target(price: f64, position: &PositionContext) -> Option<ExitReason> {
    let signal = &position.signal;
    let (stop_hit, target_hit) = match position.direction() {
        Direction::Long => (price <= signal.stop_loss, price >= signal.take_profit),
        Direction::Short => (price >= signal.stop_loss, price <= signal.take_profit),
    };
    if stop_hit {
        Some(ExitReason::StopLoss {
            price,
            stop: signal.stop_loss,
        })
    } else if target_hit {
        Some(ExitReason::TakeProfit {
            price,
            target: signal.take_profit,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::{Signal, StopTarget, StrategyKind};

    fn position(direction: Direction, pnl: f64, peak: f64) -> PositionContext {
        let stops = match direction {
            Direction::Long => StopTarget::new(direction, 100.0, 97.0, 106.0),
            Direction::Short => StopTarget::new(direction, 100.0, 103.0, 94.0),
        };
        let signal = Signal::new(StrategyKind::TrendFollowing, &stops, "test", 0);
        PositionContext {
            pnl_fraction: pnl,
            peak_pnl_fraction: peak,
            ..PositionContext::new(signal, 100.0)
        }
    }

    #[test]
    fn test_stop_and_target_long() {
        let p = position(Direction::Long, 0.0, 0.0);
        assert!(matches!(stop_or_target(96.5, &p), Some(ExitReason::StopLoss { .. })));
        assert!(matches!(stop_or_target(106.0, &p), Some(ExitReason::TakeProfit { .. })));
        assert!(stop_or_target(101.0, &p).is_none());
    }

    #[test]
    fn test_stop_and_target_short() {
        let p = position(Direction::Short, 0.0, 0.0);
        assert!(matches!(stop_or_target(103.0, &p), Some(ExitReason::StopLoss { .. })));
        assert!(matches!(stop_or_target(93.0, &p), Some(ExitReason::TakeProfit { .. })));
        assert!(stop_or_target(99.0, &p).is_none());
    }

    #[test]
    fn test_stop_touch_is_inclusive() {
        let long = position(Direction::Long, 0.0, 0.0);
        assert_eq!(
            stop_or_target(97.0, &long),
            Some(ExitReason::StopLoss { price: 97.0, stop: 97.0 })
        );
        assert!(stop_or_target(97.01, &long).is_none());

        let short = position(Direction::Short, 0.0, 0.0);
        assert!(matches!(stop_or_target(103.0, &short), Some(ExitReason::StopLoss { .. })));
        assert!(stop_or_target(102.99, &short).is_none());
    }

    #[test]
    fn test_profit_lock() {
        let lock = ProfitLock::new(0.05, 0.5);
        // Peak not reached
        assert!(lock.check(&position(Direction::Long, 0.01, 0.04)).is_none());
        // Still holding more than half the peak
        assert!(lock.check(&position(Direction::Long, 0.04, 0.06)).is_none());
        assert_eq!(
            lock.check(&position(Direction::Long, 0.03, 0.06)),
            Some(ExitReason::ProfitLock {
                peak_pnl: 0.06,
                pnl: 0.03
            })
        );
    }
}
