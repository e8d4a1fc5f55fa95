//! Risk-based position sizing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Position sizing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Fraction of equity risked if the stop is hit
    pub risk_per_trade: Decimal,
    /// Stop distances (as a fraction of entry) below this are rejected
    pub min_stop_distance: Decimal,
    pub strong_signal_threshold: f64,
    pub strong_signal_multiplier: Decimal,
    pub weak_signal_threshold: f64,
    pub weak_signal_multiplier: Decimal,
    /// Largest position as a fraction of leveraged equity
    pub max_position_ratio: Decimal,
    /// Smallest notional worth sending
    pub min_trade_notional: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: dec!(0.02),
            min_stop_distance: dec!(0.003),
            strong_signal_threshold: 0.7,
            strong_signal_multiplier: dec!(1.2),
            weak_signal_threshold: 0.4,
            weak_signal_multiplier: dec!(0.8),
            max_position_ratio: dec!(0.5),
            min_trade_notional: dec!(10),
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.risk_per_trade <= Decimal::ZERO || self.risk_per_trade > dec!(0.1) {
            return Err(format!("risk_per_trade ({}) must be in (0, 0.1]", self.risk_per_trade));
        }
        if self.min_stop_distance <= Decimal::ZERO {
            return Err("min_stop_distance must be positive".into());
        }
        if self.weak_signal_threshold > self.strong_signal_threshold {
            return Err("weak_signal_threshold must not exceed strong_signal_threshold".into());
        }
        if self.max_position_ratio <= Decimal::ZERO || self.max_position_ratio > Decimal::ONE {
            return Err(format!("max_position_ratio ({}) must be in (0, 1]", self.max_position_ratio));
        }
        Ok(())
    }
}

/// Why a sizing came out at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingRejection {
    StopTooTight,
    BelowMinimumNotional,
    InvalidPrice,
    NoLeverage,
}

impl fmt::Display for SizingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SizingRejection::StopTooTight => "stop distance below minimum",
            SizingRejection::BelowMinimumNotional => "position below minimum notional",
            SizingRejection::InvalidPrice => "entry or stop price is not a valid number",
            SizingRejection::NoLeverage => "no leverage approved",
        };
        f.write_str(s)
    }
}

/// Sizing outcome. `size` is the notional in quote currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizeResult {
    pub size: Decimal,
    /// Size in units of the traded asset
    pub base_amount: Decimal,
    pub leverage: Decimal,
    pub risk_amount: Decimal,
    pub stop_distance: Decimal,
    pub stop_distance_fraction: Decimal,
    /// Leveraged notional before the position and balance caps
    pub leveraged_value: Decimal,
    pub rejection: Option<SizingRejection>,
}

impl PositionSizeResult {
    fn rejected(leverage: Decimal, risk_amount: Decimal, rejection: SizingRejection) -> Self {
        Self {
            size: Decimal::ZERO,
            base_amount: Decimal::ZERO,
            leverage,
            risk_amount,
            stop_distance: Decimal::ZERO,
            stop_distance_fraction: Decimal::ZERO,
            leveraged_value: Decimal::ZERO,
            rejection: Some(rejection),
        }
    }

    pub fn is_tradable(&self) -> bool {
        self.rejection.is_none() && self.size > Decimal::ZERO
    }
}

/// Sizes positions so a stop-out loses `risk_per_trade` of equity.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Size a position entering at `entry` with its stop at `stop`.
    pub fn calculate(
        &self,
        equity: Decimal,
        available_balance: Decimal,
        entry: f64,
        stop: f64,
        strength: f64,
        leverage: Decimal,
    ) -> PositionSizeResult {
        let cfg = &self.config;
        let risk_amount = (equity * cfg.risk_per_trade).max(Decimal::ZERO);

        if leverage <= Decimal::ZERO {
            return PositionSizeResult::rejected(leverage, risk_amount, SizingRejection::NoLeverage);
        }

        let (entry, stop) = match (to_price(entry), to_price(stop)) {
            (Some(e), Some(s)) => (e, s),
            _ => {
                return PositionSizeResult::rejected(leverage, risk_amount, SizingRejection::InvalidPrice);
            }
        };

        let stop_distance = (entry - stop).abs();
        let stop_distance_fraction = stop_distance / entry;
        if stop_distance_fraction < cfg.min_stop_distance {
            debug!(%stop_distance_fraction, "Stop too tight to size");
            return PositionSizeResult {
                stop_distance,
                stop_distance_fraction,
                ..PositionSizeResult::rejected(leverage, risk_amount, SizingRejection::StopTooTight)
            };
        }

        let mut base = risk_amount / stop_distance_fraction;
        if strength > cfg.strong_signal_threshold {
            base *= cfg.strong_signal_multiplier;
        } else if strength < cfg.weak_signal_threshold {
            base *= cfg.weak_signal_multiplier;
        }

        let leveraged_value = base * leverage;
        let size = leveraged_value
            .min(equity * leverage * cfg.max_position_ratio)
            .min(available_balance * leverage)
            .max(Decimal::ZERO);

        let rejection = (size < cfg.min_trade_notional).then_some(SizingRejection::BelowMinimumNotional);
        let (size, base_amount) = if rejection.is_some() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (size, size / entry)
        };

        PositionSizeResult {
            size,
            base_amount,
            leverage,
            risk_amount,
            stop_distance,
            stop_distance_fraction,
            leveraged_value,
            rejection,
        }
    }
}

fn to_price(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Decimal::try_from(value).ok()
}
