//! Trend-following strategy.
//!
//! Enters with the trend when both Supertrends agree, price and the EMAs are
//! stacked in the trend direction and the directional indicators confirm.
//! The stop is the tighter of the fast Supertrend band and an ATR stop.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
    types::{
        Direction, ExitReason, IndicatorSnapshot, PositionContext, RegimeState, Signal, StopTarget,
        StrategyKind, TrendDirection,
    },
};

use crate::exits::{stop_or_target, ProfitLock};
use crate::readiness::{ConditionResult, SignalReadiness};

/// Configuration for the trend-following strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFollowingConfig {
    /// Take-profit distance in multiples of the stop distance
    pub min_risk_reward: f64,
    pub atr_stop_multiplier: f64,
    pub min_stop_distance: f64,
    pub max_stop_distance: f64,
    /// ADX required on top of a trending regime
    pub min_adx: f64,
    /// Required lead of the trend-side DI over the other
    pub min_di_spread: f64,
    pub profit_lock: ProfitLock,
    pub high_profit_lock: ProfitLock,
}

impl Default for TrendFollowingConfig {
    fn default() -> Self {
        Self {
            min_risk_reward: 1.5,
            atr_stop_multiplier: 2.5,
            min_stop_distance: 0.003,
            max_stop_distance: 0.07,
            min_adx: 20.0,
            min_di_spread: 5.0,
            profit_lock: ProfitLock::new(0.05, 0.5),
            high_profit_lock: ProfitLock::new(0.10, 0.9),
        }
    }
}

impl StrategyConfig for TrendFollowingConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        let invalid = |msg: String| StrategyError::InvalidConfig(format!("trend_following: {}", msg));

        if self.min_risk_reward <= 0.0 {
            return Err(invalid("min_risk_reward must be positive".into()));
        }
        if self.atr_stop_multiplier <= 0.0 {
            return Err(invalid("atr_stop_multiplier must be positive".into()));
        }
        if !(self.min_stop_distance > 0.0 && self.max_stop_distance > self.min_stop_distance) {
            return Err(invalid(format!(
                "max_stop_distance ({}) must exceed min_stop_distance ({}) > 0",
                self.max_stop_distance, self.min_stop_distance
            )));
        }
        self.profit_lock.validate("profit_lock").map_err(invalid)?;
        self.high_profit_lock.validate("high_profit_lock").map_err(invalid)?;
        if self.high_profit_lock.trigger <= self.profit_lock.trigger {
            return Err(invalid("high_profit_lock must trigger above profit_lock".into()));
        }
        Ok(())
    }
}

/// Supertrend / EMA trend follower for trending regimes.
#[derive(Debug, Clone, Default)]
pub struct TrendFollowingStrategy {
    config: TrendFollowingConfig,
}

impl TrendFollowingStrategy {
    pub fn new(config: TrendFollowingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendFollowingConfig {
        &self.config
    }

    /// The entry checklist for `direction`.
    pub fn entry_conditions(
        &self,
        snapshot: &IndicatorSnapshot,
        regime: &RegimeState,
        direction: Direction,
    ) -> SignalReadiness {
        let cfg = &self.config;
        let s = snapshot;
        let (trend, cmp) = match direction {
            Direction::Long => (TrendDirection::Up, ">"),
            Direction::Short => (TrendDirection::Down, "<"),
        };
        let sign = direction.sign();
        let di_spread = sign * s.di_spread();

        let conditions = vec![
            ConditionResult::new(
                "market regime",
                regime.is_trending(),
                format!("{} (ADX {:.1})", regime.regime, regime.adx),
                "trending",
            ),
            ConditionResult::new(
                "ADX strength",
                s.adx > cfg.min_adx,
                format!("{:.1}", s.adx),
                format!("> {}", cfg.min_adx),
            ),
            ConditionResult::new(
                "supertrend fast",
                s.supertrend_fast.direction == trend,
                s.supertrend_fast.direction.to_string(),
                trend.to_string(),
            ),
            ConditionResult::new(
                "supertrend slow",
                s.supertrend_slow.direction == trend,
                s.supertrend_slow.direction.to_string(),
                trend.to_string(),
            ),
            ConditionResult::new(
                "price vs EMA fast",
                sign * (s.current_price - s.ema_fast) > 0.0,
                format!("{:.2}", s.current_price),
                format!("{} {:.2}", cmp, s.ema_fast),
            ),
            ConditionResult::new(
                "EMA alignment",
                sign * (s.ema_fast - s.ema_slow) > 0.0,
                format!("fast {:.2}", s.ema_fast),
                format!("{} slow {:.2}", cmp, s.ema_slow),
            ),
            ConditionResult::new(
                "DI spread",
                di_spread >= cfg.min_di_spread,
                format!("{:.1} (+DI {:.1}, -DI {:.1})", di_spread, s.plus_di, s.minus_di),
                format!(">= {}", cfg.min_di_spread),
            ),
        ];
        SignalReadiness::new(self.kind(), direction, conditions)
    }

    /// Tighter of the fast Supertrend band and the ATR stop, unclamped.
    fn raw_stop(&self, snapshot: &IndicatorSnapshot, direction: Direction, entry: f64) -> f64 {
        let atr_offset = snapshot.atr * self.config.atr_stop_multiplier;
        match direction {
            Direction::Long => snapshot.supertrend_fast.lower_band.max(entry - atr_offset),
            Direction::Short => snapshot.supertrend_fast.upper_band.min(entry + atr_offset),
        }
    }

    fn target(&self, direction: Direction, entry: f64, stop: f64) -> f64 {
        entry + direction.sign() * (entry - stop).abs() * self.config.min_risk_reward
    }

    fn strength(&self, snapshot: &IndicatorSnapshot, direction: Direction) -> f64 {
        let ema_gap = direction.sign() * snapshot.ema_gap();
        let adx_strength = ((snapshot.adx - 25.0) / 25.0).min(1.0);
        let di_strength = (direction.sign() * snapshot.di_spread() / 20.0).min(1.0);
        ((ema_gap * 10.0 + adx_strength + di_strength) / 3.0).clamp(0.4, 1.0)
    }

    fn signal(&self, snapshot: &IndicatorSnapshot, direction: Direction) -> Option<Signal> {
        let cfg = &self.config;
        let entry = snapshot.current_price;
        let stop = self.raw_stop(snapshot, direction, entry);
        let distance = direction.sign() * (entry - stop) / entry;

        if !(cfg.min_stop_distance..=cfg.max_stop_distance).contains(&distance) {
            debug!(
                %direction,
                stop_distance = distance,
                "Trend entry discarded: stop distance out of bounds"
            );
            return None;
        }

        let stops = StopTarget::new(direction, entry, stop, self.target(direction, entry, stop));
        let strength = self.strength(snapshot, direction);
        let reason = format!(
            "trend {}: ADX {:.1}, +DI {:.1}, -DI {:.1}, supertrend {}",
            direction, snapshot.adx, snapshot.plus_di, snapshot.minus_di, snapshot.supertrend_fast.direction
        );

        Some(
            Signal::new(self.kind(), &stops, reason, snapshot.timestamp)
                .with_strength(strength)
                .with_confidence((strength + 0.2).min(0.85))
                .with_indicator("adx", snapshot.adx)
                .with_indicator("plus_di", snapshot.plus_di)
                .with_indicator("minus_di", snapshot.minus_di)
                .with_indicator("ema_fast", snapshot.ema_fast)
                .with_indicator("ema_slow", snapshot.ema_slow)
                .with_indicator("atr", snapshot.atr)
                .with_indicator("supertrend_fast", snapshot.supertrend_fast.value),
        )
    }
}

impl Strategy for TrendFollowingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrendFollowing
    }

    fn description(&self) -> &str {
        "Follows established trends: dual Supertrend, EMA stack and DI confirmation"
    }

    fn is_applicable(&self, regime: &RegimeState) -> bool {
        regime.is_trending() && regime.adx > self.config.min_adx
    }

    fn check_entry(&self, snapshot: &IndicatorSnapshot, regime: &RegimeState) -> Option<Signal> {
        if !self.is_applicable(regime) {
            return None;
        }
        [Direction::Long, Direction::Short]
            .into_iter()
            .find(|d| self.entry_conditions(snapshot, regime, *d).is_ready())
            .and_then(|d| self.signal(snapshot, d))
    }

    fn check_exit(&self, snapshot: &IndicatorSnapshot, position: &PositionContext) -> Option<ExitReason> {
        stop_or_target(snapshot.current_price, position)
            .or_else(|| self.config.high_profit_lock.check(position))
            .or_else(|| self.config.profit_lock.check(position))
    }

    fn calculate_stops(&self, snapshot: &IndicatorSnapshot, direction: Direction, entry_price: f64) -> StopTarget {
        let cfg = &self.config;
        let raw = self.raw_stop(snapshot, direction, entry_price);
        let distance = if entry_price > 0.0 {
            (direction.sign() * (entry_price - raw) / entry_price).clamp(cfg.min_stop_distance, cfg.max_stop_distance)
        } else {
            cfg.min_stop_distance
        };
        let stop = entry_price - direction.sign() * distance * entry_price;
        StopTarget::new(direction, entry_price, stop, self.target(direction, entry_price, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::{MarketRegime, SupertrendReading};

    fn trending(adx: f64) -> RegimeState {
        RegimeState {
            regime: MarketRegime::Trending,
            adx,
            ..RegimeState::unknown()
        }
    }

    fn supertrend(direction: TrendDirection, lower: f64, upper: f64) -> SupertrendReading {
        let value = match direction {
            TrendDirection::Up => lower,
            TrendDirection::Down => upper,
        };
        SupertrendReading {
            value,
            direction,
            upper_band: upper,
            lower_band: lower,
        }
    }

    fn uptrend() -> IndicatorSnapshot {
        let mut s = IndicatorSnapshot::neutral(100.0, 1_000);
        s.supertrend_fast = supertrend(TrendDirection::Up, 97.5, 104.0);
        s.supertrend_slow = supertrend(TrendDirection::Up, 95.0, 106.0);
        s.ema_fast = 99.0;
        s.ema_slow = 97.0;
        s.adx = 35.0;
        s.plus_di = 30.0;
        s.minus_di = 15.0;
        s.atr = 1.5;
        s.atr_percent = 0.015;
        s
    }

    fn downtrend() -> IndicatorSnapshot {
        let mut s = uptrend();
        s.supertrend_fast = supertrend(TrendDirection::Down, 96.0, 102.0);
        s.supertrend_slow = supertrend(TrendDirection::Down, 94.0, 105.0);
        s.ema_fast = 101.0;
        s.ema_slow = 103.0;
        s.plus_di = 12.0;
        s.minus_di = 28.0;
        s
    }

    #[test]
    fn test_long_entry() {
        let strategy = TrendFollowingStrategy::default();
        let signal = strategy.check_entry(&uptrend(), &trending(35.0)).unwrap();

        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.strategy, StrategyKind::TrendFollowing);
        // Supertrend band 97.5 is tighter than 100 - 2.5 * 1.5 = 96.25
        assert!((signal.stop_loss - 97.5).abs() < 1e-10);
        assert!((signal.take_profit - 103.75).abs() < 1e-10);
        assert!((signal.risk_reward_ratio - 1.5).abs() < 1e-10);

        let expected = (10.0 * 2.0 / 97.0 + 0.4 + 0.75) / 3.0;
        assert!((signal.strength - expected).abs() < 1e-10);
        assert!((signal.confidence - (expected + 0.2)).abs() < 1e-10);
        assert_eq!(signal.timestamp, 1_000);
        assert_eq!(signal.indicators.get("adx"), Some(&35.0));
    }

    #[test]
    fn test_short_entry_uses_tighter_atr_stop() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = downtrend();
        s.supertrend_fast.upper_band = 105.0;
        let signal = strategy.check_entry(&s, &trending(35.0)).unwrap();

        assert_eq!(signal.direction, Direction::Short);
        assert!((signal.stop_loss - 103.75).abs() < 1e-10);
        assert!((signal.take_profit - 94.375).abs() < 1e-10);
    }

    #[test]
    fn test_strength_floor() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = uptrend();
        s.adx = 22.0;
        s.plus_di = 21.0;
        s.minus_di = 15.0;
        s.ema_fast = 99.0;
        s.ema_slow = 98.9;
        let signal = strategy.check_entry(&s, &trending(26.0)).unwrap();
        assert!((signal.strength - 0.4).abs() < 1e-10);
        assert!((signal.confidence - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_not_applicable_outside_trend() {
        let strategy = TrendFollowingStrategy::default();
        assert!(strategy.check_entry(&uptrend(), &RegimeState::unknown()).is_none());
        assert!(!strategy.is_applicable(&trending(18.0)));
    }

    #[test]
    fn test_conflicting_conditions_block_entry() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = uptrend();
        s.supertrend_slow.direction = TrendDirection::Down;
        assert!(strategy.check_entry(&s, &trending(35.0)).is_none());

        let mut s = uptrend();
        s.minus_di = 27.0;
        let readiness = strategy.entry_conditions(&s, &trending(35.0), Direction::Long);
        assert_eq!(readiness.missing().collect::<Vec<_>>(), vec!["DI spread"]);
    }

    #[test]
    fn test_stop_out_of_bounds_discards() {
        let strategy = TrendFollowingStrategy::default();

        let mut tight = uptrend();
        tight.supertrend_fast.lower_band = 99.8;
        assert!(strategy.check_entry(&tight, &trending(35.0)).is_none());

        let mut wide = uptrend();
        wide.supertrend_fast.lower_band = 80.0;
        wide.atr = 4.0;
        assert!(strategy.check_entry(&wide, &trending(35.0)).is_none());
    }

    #[test]
    fn test_calculate_stops_clamps() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = uptrend();
        s.supertrend_fast.lower_band = 99.8;
        let stops = strategy.calculate_stops(&s, Direction::Long, 100.0);
        assert!((stops.stop_loss - 99.7).abs() < 1e-10);
        assert!((stops.take_profit - 100.45).abs() < 1e-10);

        s.supertrend_fast.lower_band = 50.0;
        s.atr = 20.0;
        let stops = strategy.calculate_stops(&s, Direction::Long, 100.0);
        assert!((stops.stop_loss - 93.0).abs() < 1e-10);
    }

    fn held(pnl: f64, peak: f64) -> PositionContext {
        let strategy = TrendFollowingStrategy::default();
        let signal = strategy.check_entry(&uptrend(), &trending(35.0)).unwrap();
        PositionContext {
            pnl_fraction: pnl,
            peak_pnl_fraction: peak,
            ..PositionContext::new(signal, 100.0)
        }
    }

    #[test]
    fn test_exits() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = uptrend();

        s.current_price = 97.0;
        assert!(matches!(strategy.check_exit(&s, &held(-0.03, 0.0)), Some(ExitReason::StopLoss { .. })));

        s.current_price = 104.0;
        assert!(matches!(strategy.check_exit(&s, &held(0.04, 0.04)), Some(ExitReason::TakeProfit { .. })));

        s.current_price = 101.0;
        assert!(strategy.check_exit(&s, &held(0.01, 0.02)).is_none());
    }

    #[test]
    fn test_profit_lock_tiers() {
        let strategy = TrendFollowingStrategy::default();
        let mut s = uptrend();
        s.current_price = 101.0;

        // Peak 6%: lock at half
        assert!(strategy.check_exit(&s, &held(0.04, 0.06)).is_none());
        assert!(matches!(strategy.check_exit(&s, &held(0.03, 0.06)), Some(ExitReason::ProfitLock { .. })));

        // Peak 12%: lock at 90%
        assert!(strategy.check_exit(&s, &held(0.11, 0.12)).is_none());
        assert_eq!(
            strategy.check_exit(&s, &held(0.10, 0.12)),
            Some(ExitReason::ProfitLock {
                peak_pnl: 0.12,
                pnl: 0.10
            })
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(TrendFollowingConfig::default().validate().is_ok());
        let config = TrendFollowingConfig {
            max_stop_distance: 0.001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
