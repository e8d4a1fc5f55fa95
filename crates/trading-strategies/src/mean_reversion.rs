//! Mean-reversion strategy for ranging regimes.
//!
//! Fades extremes: buys near the lower Bollinger band with RSI deeply
//! oversold, sells near the upper band with RSI overbought, targeting the
//! middle band. Positions are time boxed.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
    types::{
        Direction, ExitReason, IndicatorSnapshot, PositionContext, RegimeState, Signal, StopTarget,
        StrategyKind,
    },
};

use crate::exits::{stop_or_target, ProfitLock};
use crate::readiness::{ConditionResult, SignalReadiness};

/// Configuration for the mean-reversion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    /// Desired take-profit distance in multiples of the stop distance
    pub min_risk_reward: f64,
    /// Signals whose realized ratio falls below this are dropped
    pub min_acceptable_risk_reward: f64,
    pub atr_stop_multiplier: f64,
    pub max_stop_distance: f64,
    /// Band position below which a long is considered
    pub oversold_position: f64,
    /// Band position above which a short is considered
    pub overbought_position: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Long targets are capped at this fraction of the upper band
    pub upper_target_cap: f64,
    /// Short targets are floored at this multiple of the lower band
    pub lower_target_cap: f64,
    pub max_holding_cycles: u32,
    pub profit_lock: ProfitLock,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            min_risk_reward: 1.5,
            min_acceptable_risk_reward: 1.1,
            atr_stop_multiplier: 1.5,
            max_stop_distance: 0.045,
            oversold_position: 0.25,
            overbought_position: 0.75,
            rsi_oversold: 25.0,
            rsi_overbought: 75.0,
            upper_target_cap: 0.98,
            lower_target_cap: 1.02,
            max_holding_cycles: 16,
            profit_lock: ProfitLock::new(0.05, 0.5),
        }
    }
}

impl StrategyConfig for MeanReversionConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        let invalid = |msg: String| StrategyError::InvalidConfig(format!("mean_reversion: {}", msg));

        if !(self.oversold_position > 0.0
            && self.oversold_position < self.overbought_position
            && self.overbought_position < 1.0)
        {
            return Err(invalid(format!(
                "band thresholds must satisfy 0 < oversold ({}) < overbought ({}) < 1",
                self.oversold_position, self.overbought_position
            )));
        }
        if !(0.0 < self.rsi_oversold && self.rsi_oversold < self.rsi_overbought && self.rsi_overbought < 100.0) {
            return Err(invalid(format!(
                "RSI thresholds must satisfy 0 < oversold ({}) < overbought ({}) < 100",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        if self.min_acceptable_risk_reward > self.min_risk_reward {
            return Err(invalid("min_acceptable_risk_reward must not exceed min_risk_reward".into()));
        }
        if self.atr_stop_multiplier <= 0.0 || self.max_stop_distance <= 0.0 {
            return Err(invalid("stop parameters must be positive".into()));
        }
        if self.max_holding_cycles == 0 {
            return Err(invalid("max_holding_cycles must be at least 1".into()));
        }
        self.profit_lock.validate("profit_lock").map_err(invalid)
    }
}

/// Bollinger / RSI reversion for ranging regimes.
#[derive(Debug, Clone, Default)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MeanReversionConfig {
        &self.config
    }

    pub fn entry_conditions(
        &self,
        snapshot: &IndicatorSnapshot,
        regime: &RegimeState,
        direction: Direction,
    ) -> SignalReadiness {
        let cfg = &self.config;
        let position = snapshot.bollinger.position;
        let rsi = snapshot.rsi;

        let (band_ok, band_required, rsi_ok, rsi_required) = match direction {
            Direction::Long => (
                position < cfg.oversold_position,
                format!("< {:.2}", cfg.oversold_position),
                rsi < cfg.rsi_oversold,
                format!("< {}", cfg.rsi_oversold),
            ),
            Direction::Short => (
                position > cfg.overbought_position,
                format!("> {:.2}", cfg.overbought_position),
                rsi > cfg.rsi_overbought,
                format!("> {}", cfg.rsi_overbought),
            ),
        };

        let conditions = vec![
            ConditionResult::new(
                "market regime",
                regime.is_ranging(),
                format!("{} (ADX {:.1})", regime.regime, regime.adx),
                "ranging",
            ),
            ConditionResult::new("band position", band_ok, format!("{:.2}", position), band_required),
            ConditionResult::new("RSI", rsi_ok, format!("{:.1}", rsi), rsi_required),
        ];
        SignalReadiness::new(self.kind(), direction, conditions)
    }

    fn stop_distance(&self, snapshot: &IndicatorSnapshot, entry: f64) -> f64 {
        (snapshot.atr * self.config.atr_stop_multiplier).min(entry * self.config.max_stop_distance)
    }

    fn strength(&self, snapshot: &IndicatorSnapshot, direction: Direction) -> f64 {
        let cfg = &self.config;
        let rsi = snapshot.rsi;
        let position = snapshot.bollinger.position;
        let (rsi_strength, band_strength) = match direction {
            Direction::Long => (
                if rsi < 30.0 { (30.0 - rsi) / 30.0 } else { 0.0 },
                (cfg.oversold_position - position) / cfg.oversold_position,
            ),
            Direction::Short => (
                if rsi > 70.0 { (rsi - 70.0) / 30.0 } else { 0.0 },
                (position - cfg.overbought_position) / (1.0 - cfg.overbought_position),
            ),
        };
        (rsi_strength + band_strength) / 2.0
    }

    fn signal(&self, snapshot: &IndicatorSnapshot, direction: Direction) -> Option<Signal> {
        let cfg = &self.config;
        let entry = snapshot.current_price;
        let bands = &snapshot.bollinger;
        let sign = direction.sign();

        let stop_distance = self.stop_distance(snapshot, entry);
        if stop_distance.is_nan() || stop_distance <= 0.0 {
            return None;
        }
        let stop = entry - sign * stop_distance;

        let min_target = entry + sign * stop_distance * cfg.min_risk_reward;
        let target = if sign * (bands.middle - min_target) >= 0.0 {
            bands.middle
        } else {
            min_target
        };
        let target = match direction {
            Direction::Long => target.min(bands.upper * cfg.upper_target_cap),
            Direction::Short => target.max(bands.lower * cfg.lower_target_cap),
        };

        let stops = StopTarget::new(direction, entry, stop, target);
        if stops.risk_reward_ratio < cfg.min_acceptable_risk_reward {
            debug!(
                %direction,
                risk_reward = stops.risk_reward_ratio,
                min = cfg.min_acceptable_risk_reward,
                "Reversion entry discarded: target too close"
            );
            return None;
        }

        let strength = self.strength(snapshot, direction);
        let reason = format!(
            "reversion {}: RSI {:.1}, band position {:.2}, RR {:.2}",
            direction, snapshot.rsi, bands.position, stops.risk_reward_ratio
        );

        Some(
            Signal::new(self.kind(), &stops, reason, snapshot.timestamp)
                .with_strength(strength)
                .with_confidence((strength + 0.3).min(0.8))
                .with_indicator("rsi", snapshot.rsi)
                .with_indicator("bb_position", bands.position)
                .with_indicator("bb_upper", bands.upper)
                .with_indicator("bb_middle", bands.middle)
                .with_indicator("bb_lower", bands.lower)
                .with_indicator("atr", snapshot.atr),
        )
    }
}

impl Strategy for MeanReversionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
    }

    fn description(&self) -> &str {
        "Fades Bollinger band extremes confirmed by RSI, targeting the middle band"
    }

    fn is_applicable(&self, regime: &RegimeState) -> bool {
        regime.is_ranging()
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
        let max_cycles = self.config.max_holding_cycles;
        stop_or_target(snapshot.current_price, position)
            .or_else(|| self.config.profit_lock.check(position))
            .or_else(|| {
                (position.cycles_held > max_cycles).then_some(ExitReason::TimeLimit {
                    cycles_held: position.cycles_held,
                    max_cycles,
                })
            })
    }

    fn calculate_stops(&self, snapshot: &IndicatorSnapshot, direction: Direction, entry_price: f64) -> StopTarget {
        let distance = self.stop_distance(snapshot, entry_price);
        let sign = direction.sign();
        StopTarget::new(
            direction,
            entry_price,
            entry_price - sign * distance,
            entry_price + sign * distance * self.config.min_risk_reward,
        )
    }

    fn max_holding_cycles(&self) -> Option<u32> {
        Some(self.config.max_holding_cycles)
    }
}
