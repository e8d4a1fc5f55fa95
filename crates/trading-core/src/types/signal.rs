//! Trading signals, stop/target pairs and exit decisions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Direction, StrategyKind};

/// A stop-loss / take-profit pair for a position opened at `entry`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTarget {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Profit distance over stop distance; 0 when the stop distance is not positive
    pub risk_reward_ratio: f64,
    /// Stop distance as a fraction of entry, negative if the stop is on the wrong side
    pub stop_distance_fraction: f64,
    /// Target distance as a fraction of entry, negative if the target is on the wrong side
    pub profit_distance_fraction: f64,
}

impl StopTarget {
    pub fn new(direction: Direction, entry: f64, stop_loss: f64, take_profit: f64) -> Self {
        let stop_distance = direction.sign() * (entry - stop_loss);
        let profit_distance = direction.sign() * (take_profit - entry);
        let risk_reward_ratio = if stop_distance > 0.0 {
            profit_distance / stop_distance
        } else {
            0.0
        };
        let (stop_distance_fraction, profit_distance_fraction) = if entry > 0.0 {
            (stop_distance / entry, profit_distance / entry)
        } else {
            (0.0, 0.0)
        };
        Self {
            direction,
            entry,
            stop_loss,
            take_profit,
            risk_reward_ratio,
            stop_distance_fraction,
            profit_distance_fraction,
        }
    }

    /// Absolute price distance from entry to the stop.
    pub fn stop_distance(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

/// A directional entry recommendation with its risk levels pre-computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub strategy: StrategyKind,
    /// Signal strength in [0, 1], feeds the position sizer
    pub strength: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward_ratio: f64,
    pub reason: String,
    /// Timestamp of the bar the signal was generated on, Unix ms
    pub timestamp: i64,
    /// Indicator values that justified the signal
    pub indicators: BTreeMap<String, f64>,
}

impl Signal {
    pub fn new(strategy: StrategyKind, stops: &StopTarget, reason: impl Into<String>, timestamp: i64) -> Self {
        Self {
            direction: stops.direction,
            strategy,
            strength: 0.5,
            confidence: 0.5,
            entry_price: stops.entry,
            stop_loss: stops.stop_loss,
            take_profit: stops.take_profit,
            risk_reward_ratio: stops.risk_reward_ratio,
            reason: reason.into(),
            timestamp,
            indicators: BTreeMap::new(),
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_indicator(mut self, name: &str, value: f64) -> Self {
        self.indicators.insert(name.to_string(), value);
        self
    }

    /// The signal's stop/target pair.
    pub fn stops(&self) -> StopTarget {
        StopTarget::new(self.direction, self.entry_price, self.stop_loss, self.take_profit)
    }
}

/// Why an open position should be closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExitReason {
    StopLoss { price: f64, stop: f64 },
    TakeProfit { price: f64, target: f64 },
    /// Gave back too much of the peak gain
    ProfitLock { peak_pnl: f64, pnl: f64 },
    /// Held longer than the strategy allows
    TimeLimit { cycles_held: u32, max_cycles: u32 },
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss { price, stop } => {
                write!(f, "stop-loss hit: price {:.4} through stop {:.4}", price, stop)
            }
            ExitReason::TakeProfit { price, target } => {
                write!(f, "take-profit hit: price {:.4} reached target {:.4}", price, target)
            }
            ExitReason::ProfitLock { peak_pnl, pnl } => write!(
                f,
                "profit lock: P&L {:.2}% fell back from peak {:.2}%",
                pnl * 100.0,
                peak_pnl * 100.0
            ),
            ExitReason::TimeLimit {
                cycles_held,
                max_cycles,
            } => write!(f, "time limit: held {} cycles (max {})", cycles_held, max_cycles),
        }
    }
}

/// What the caller knows about an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionContext {
    pub entry_price: f64,
    pub signal: Signal,
    /// Current unrealized P&L as a fraction of entry
    pub pnl_fraction: f64,
    /// Best P&L fraction seen since entry
    pub peak_pnl_fraction: f64,
    /// Evaluation cycles since entry
    pub cycles_held: u32,
}

impl PositionContext {
    pub fn new(signal: Signal, entry_price: f64) -> Self {
        Self {
            entry_price,
            signal,
            pnl_fraction: 0.0,
            peak_pnl_fraction: 0.0,
            cycles_held: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.signal.direction
    }

    /// Advance one cycle at `price`, updating P&L and the running peak.
    pub fn mark(&mut self, price: f64) {
        self.pnl_fraction = self.direction().pnl_fraction(self.entry_price, price);
        self.peak_pnl_fraction = self.peak_pnl_fraction.max(self.pnl_fraction);
        self.cycles_held = self.cycles_held.saturating_add(1);
    }
}
