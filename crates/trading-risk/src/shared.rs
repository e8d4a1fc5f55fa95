//! Account-wide risk manager shared between symbol loops.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trading_core::StrategyKind;

use crate::risk_manager::{EmergencyReason, RiskConfig, RiskManager, RiskMetrics, TradeEligibility};

/// Emergency and eligibility status taken under a single lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub emergency: Option<EmergencyReason>,
    pub eligibility: TradeEligibility,
}

impl RiskAssessment {
    pub fn leverage(&self) -> Decimal {
        self.eligibility.leverage()
    }
}

/// Cloneable handle to one [`RiskManager`].
///
/// Every call holds the lock for its whole duration, so a trade recorded by
/// one symbol loop is either fully visible to another loop's assessment or
/// not at all.
#[derive(Debug, Clone)]
pub struct SharedRiskManager {
    inner: Arc<Mutex<RiskManager>>,
}

impl SharedRiskManager {
    pub fn new(manager: RiskManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn with_config(config: RiskConfig, initial_equity: Decimal, now: DateTime<Utc>) -> Self {
        Self::new(RiskManager::new(config, initial_equity, now))
    }

    // A panic in another loop leaves the counters consistent (every mutation
    // is a plain field update), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, RiskManager> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn assess(&self, now: DateTime<Utc>) -> RiskAssessment {
        let mut manager = self.lock();
        let emergency = manager.should_emergency_stop(now);
        let eligibility = manager.can_trade(now);
        RiskAssessment {
            emergency,
            eligibility,
        }
    }

    pub fn record_trade(&self, pnl: Decimal, strategy: StrategyKind, now: DateTime<Utc>) {
        self.lock().record_trade(pnl, strategy, now);
    }

    pub fn update_balance(&self, equity: Decimal, now: DateTime<Utc>) {
        self.lock().update_balance(equity, now);
    }

    pub fn metrics(&self, now: DateTime<Utc>) -> RiskMetrics {
        self.lock().metrics(now)
    }

    /// Run `f` with exclusive access to the manager.
    pub fn with<R>(&self, f: impl FnOnce(&mut RiskManager) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedRiskManager::with_config(RiskConfig::default(), dec!(1000), t0());
        let other = shared.clone();
        other.record_trade(dec!(-5), StrategyKind::TrendFollowing, t0());

        let assessment = shared.assess(t0() + Duration::seconds(10));
        assert!(assessment.emergency.is_none());
        assert!(!assessment.eligibility.is_eligible());
        assert_eq!(assessment.leverage(), Decimal::ZERO);
    }

    #[test]
    fn test_concurrent_records_are_all_applied() {
        let shared = SharedRiskManager::with_config(RiskConfig::default(), dec!(1000), t0());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for j in 0..10 {
                        let now = t0() + Duration::seconds(i * 100 + j);
                        shared.record_trade(dec!(1), StrategyKind::MeanReversion, now);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = shared.metrics(t0() + Duration::hours(1));
        assert_eq!(metrics.total_trades, 40);
        assert_eq!(metrics.equity, dec!(1040));
        assert_eq!(shared.with(|m| m.consecutive_wins()), 40);
    }

    #[test]
    fn test_emergency_reported_with_eligibility() {
        let shared = SharedRiskManager::with_config(RiskConfig::default(), dec!(1000), t0());
        shared.update_balance(dec!(400), t0());
        let assessment = shared.assess(t0());
        assert!(matches!(assessment.emergency, Some(EmergencyReason::EquityFloor { .. })));
    }
}
