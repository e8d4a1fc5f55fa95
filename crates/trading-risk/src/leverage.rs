//! Dynamic leverage pipeline.
//!
//! Leverage starts at the base and passes through performance and limit
//! adjustments in a fixed order. A hard daily-loss or drawdown breach yields
//! exactly zero and ends the pipeline; otherwise the result is clamped to
//! `[min_leverage, max_leverage]`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Leverage pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageConfig {
    pub base_leverage: Decimal,
    pub max_leverage: Decimal,
    pub min_leverage: Decimal,
    pub win_rate_boost_threshold: Decimal,
    pub win_rate_boost_multiplier: Decimal,
    pub win_rate_reduce_threshold: Decimal,
    pub win_rate_reduce_multiplier: Decimal,
    /// Consecutive losses that force leverage down to the minimum
    pub loss_streak_floor: u32,
    /// Consecutive losses that start trimming leverage
    pub loss_streak_reduce: u32,
    pub loss_streak_multiplier: Decimal,
    pub win_streak_boost: u32,
    pub win_streak_multiplier: Decimal,
    /// Applied once the day's loss passes half of the daily limit
    pub daily_loss_reduce_multiplier: Decimal,
    /// Fraction of the drawdown limit at which leverage is trimmed
    pub drawdown_warning_ratio: Decimal,
    pub drawdown_reduce_multiplier: Decimal,
    /// Weekly gain above which leverage is capped at the base
    pub weekly_profit_protection: Decimal,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            base_leverage: dec!(2.0),
            max_leverage: dec!(5.0),
            min_leverage: dec!(1.0),
            win_rate_boost_threshold: dec!(0.6),
            win_rate_boost_multiplier: dec!(1.2),
            win_rate_reduce_threshold: dec!(0.4),
            win_rate_reduce_multiplier: dec!(0.7),
            loss_streak_floor: 3,
            loss_streak_reduce: 2,
            loss_streak_multiplier: dec!(0.8),
            win_streak_boost: 3,
            win_streak_multiplier: dec!(1.1),
            daily_loss_reduce_multiplier: dec!(0.5),
            drawdown_warning_ratio: dec!(0.7),
            drawdown_reduce_multiplier: dec!(0.6),
            weekly_profit_protection: dec!(0.10),
        }
    }
}

impl LeverageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_leverage <= Decimal::ZERO {
            return Err(format!("min_leverage ({}) must be positive", self.min_leverage));
        }
        if !(self.min_leverage <= self.base_leverage && self.base_leverage <= self.max_leverage) {
            return Err(format!(
                "leverage must satisfy min ({}) <= base ({}) <= max ({})",
                self.min_leverage, self.base_leverage, self.max_leverage
            ));
        }
        if self.win_rate_reduce_threshold > self.win_rate_boost_threshold {
            return Err("win_rate_reduce_threshold must not exceed win_rate_boost_threshold".into());
        }
        if self.loss_streak_reduce > self.loss_streak_floor {
            return Err("loss_streak_reduce must not exceed loss_streak_floor".into());
        }
        Ok(())
    }
}

/// Account facts the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverageInputs {
    pub win_rate: Decimal,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    /// Today's P&L over the equity at the start of the day
    pub daily_pnl_fraction: Decimal,
    /// This week's P&L over the equity at the start of the week
    pub weekly_pnl_fraction: Decimal,
    pub drawdown: Decimal,
    pub max_daily_loss: Decimal,
    pub max_drawdown: Decimal,
}

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageStep {
    Base,
    WinRateBoost,
    WinRateReduce,
    LossStreakFloor,
    LossStreakReduce,
    WinStreakBoost,
    DailyLossHalt,
    DailyLossReduce,
    DrawdownHalt,
    DrawdownReduce,
    WeeklyProfitCap,
    Clamp,
}

/// The leverage after a stage that changed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeverageAdjustment {
    pub step: LeverageStep,
    pub leverage: Decimal,
}

/// Hard limit that zeroed the leverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageHalt {
    DailyLoss,
    Drawdown,
}

/// Pipeline result with the trail of stages that touched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageDecision {
    pub leverage: Decimal,
    pub halt: Option<LeverageHalt>,
    pub adjustments: Vec<LeverageAdjustment>,
}

impl LeverageDecision {
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}

struct Trail {
    leverage: Decimal,
    adjustments: Vec<LeverageAdjustment>,
}

impl Trail {
    fn set(&mut self, step: LeverageStep, leverage: Decimal) {
        if leverage != self.leverage || step == LeverageStep::Base {
            self.leverage = leverage;
            self.adjustments.push(LeverageAdjustment { step, leverage });
        }
    }

    fn halt(mut self, step: LeverageStep, halt: LeverageHalt) -> LeverageDecision {
        self.set(step, Decimal::ZERO);
        LeverageDecision {
            leverage: Decimal::ZERO,
            halt: Some(halt),
            adjustments: self.adjustments,
        }
    }
}

/// Run the leverage pipeline.
pub fn calculate_leverage(config: &LeverageConfig, inputs: &LeverageInputs) -> LeverageDecision {
    let mut trail = Trail {
        leverage: config.base_leverage,
        adjustments: Vec::with_capacity(4),
    };
    trail.set(LeverageStep::Base, config.base_leverage);

    if inputs.win_rate > config.win_rate_boost_threshold {
        trail.set(LeverageStep::WinRateBoost, trail.leverage * config.win_rate_boost_multiplier);
    } else if inputs.win_rate < config.win_rate_reduce_threshold {
        trail.set(LeverageStep::WinRateReduce, trail.leverage * config.win_rate_reduce_multiplier);
    }

    if inputs.consecutive_losses >= config.loss_streak_floor {
        trail.set(LeverageStep::LossStreakFloor, config.min_leverage);
    } else {
        if inputs.consecutive_losses >= config.loss_streak_reduce {
            trail.set(LeverageStep::LossStreakReduce, trail.leverage * config.loss_streak_multiplier);
        }
        if inputs.consecutive_wins >= config.win_streak_boost {
            trail.set(LeverageStep::WinStreakBoost, trail.leverage * config.win_streak_multiplier);
        }
    }

    if inputs.daily_pnl_fraction < -inputs.max_daily_loss {
        return trail.halt(LeverageStep::DailyLossHalt, LeverageHalt::DailyLoss);
    }
    if inputs.daily_pnl_fraction < -(inputs.max_daily_loss * dec!(0.5)) {
        trail.set(LeverageStep::DailyLossReduce, trail.leverage * config.daily_loss_reduce_multiplier);
    }

    if inputs.drawdown > inputs.max_drawdown {
        return trail.halt(LeverageStep::DrawdownHalt, LeverageHalt::Drawdown);
    }
    if inputs.drawdown > inputs.max_drawdown * config.drawdown_warning_ratio {
        trail.set(LeverageStep::DrawdownReduce, trail.leverage * config.drawdown_reduce_multiplier);
    }

    if inputs.weekly_pnl_fraction > config.weekly_profit_protection {
        trail.set(LeverageStep::WeeklyProfitCap, trail.leverage.min(config.base_leverage));
    }

    let clamped = trail.leverage.clamp(config.min_leverage, config.max_leverage);
    trail.set(LeverageStep::Clamp, clamped);

    LeverageDecision {
        leverage: trail.leverage,
        halt: None,
        adjustments: trail.adjustments,
    }
}
