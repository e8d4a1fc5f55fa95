//! Account-level risk state: dynamic leverage, trade eligibility and the
//! emergency stop.
//!
//! Every time-dependent method takes `now` explicitly. Day and week P&L roll
//! over lazily the first time the manager is touched after a UTC day or ISO
//! week boundary.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};
use trading_core::{StrategyKind, TradingError};

use crate::history::{day_start, week_start, PeriodPnl, TradeRecord};
use crate::leverage::{calculate_leverage, LeverageConfig, LeverageDecision, LeverageInputs};

/// Hard limits that make the account ineligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Day loss, as a fraction of start-of-day equity, that halts trading
    pub max_daily_loss: Decimal,
    /// Drawdown from peak equity that halts trading
    pub max_drawdown: Decimal,
    pub max_consecutive_losses: u32,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_daily_loss: dec!(0.05),
            max_drawdown: dec!(0.15),
            max_consecutive_losses: 5,
        }
    }
}

/// Pause after losing trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub after_loss_secs: i64,
    pub after_loss_streak_secs: i64,
    /// Consecutive losses that switch to the longer cooldown
    pub loss_streak_threshold: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            after_loss_secs: 300,
            after_loss_streak_secs: 1800,
            loss_streak_threshold: 3,
        }
    }
}

/// Conditions that call for liquidating everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    pub max_daily_loss: Decimal,
    /// Equity below this fraction of the initial equity
    pub min_equity_ratio: Decimal,
    pub rapid_loss_count: u32,
    pub rapid_loss_window_secs: i64,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: dec!(0.10),
            min_equity_ratio: dec!(0.5),
            rapid_loss_count: 3,
            rapid_loss_window_secs: 1800,
        }
    }
}

/// Risk manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub limits: RiskLimits,
    pub leverage: LeverageConfig,
    pub cooldown: CooldownConfig,
    pub emergency: EmergencyConfig,
    /// Most recent trades used for the win rate
    pub win_rate_lookback: usize,
    /// Trade records retained
    pub history_capacity: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            limits: RiskLimits::default(),
            leverage: LeverageConfig::default(),
            cooldown: CooldownConfig::default(),
            emergency: EmergencyConfig::default(),
            win_rate_lookback: 20,
            history_capacity: 100,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), TradingError> {
        let invalid =
            |msg: String| -> Result<(), TradingError> { Err(TradingError::Config(format!("risk: {}", msg))) };

        self.leverage.validate().or_else(invalid)?;
        if self.limits.max_daily_loss <= Decimal::ZERO || self.limits.max_drawdown <= Decimal::ZERO {
            return invalid("max_daily_loss and max_drawdown must be positive".into());
        }
        if self.emergency.max_daily_loss < self.limits.max_daily_loss {
            return invalid(format!(
                "emergency max_daily_loss ({}) must not be tighter than the trading limit ({})",
                self.emergency.max_daily_loss, self.limits.max_daily_loss
            ));
        }
        if self.win_rate_lookback == 0 || self.history_capacity < self.win_rate_lookback {
            return invalid(format!(
                "history_capacity ({}) must be at least win_rate_lookback ({}) > 0",
                self.history_capacity, self.win_rate_lookback
            ));
        }
        if self.cooldown.after_loss_secs < 0 || self.cooldown.after_loss_streak_secs < 0 {
            return invalid("cooldown durations must not be negative".into());
        }
        Ok(())
    }
}

/// Why trading is currently not allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IneligibleReason {
    Cooldown { remaining_secs: i64 },
    DailyLossLimit { daily_pnl_fraction: Decimal },
    DrawdownLimit { drawdown: Decimal },
    LossStreak { consecutive_losses: u32 },
    LeverageHalted,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::Cooldown { remaining_secs } => {
                write!(f, "cooling down after a loss ({}s remaining)", remaining_secs)
            }
            IneligibleReason::DailyLossLimit { daily_pnl_fraction } => {
                write!(f, "daily loss limit reached ({:.2}%)", daily_pnl_fraction * dec!(100))
            }
            IneligibleReason::DrawdownLimit { drawdown } => {
                write!(f, "drawdown limit reached ({:.2}%)", drawdown * dec!(100))
            }
            IneligibleReason::LossStreak { consecutive_losses } => {
                write!(f, "{} consecutive losses", consecutive_losses)
            }
            IneligibleReason::LeverageHalted => f.write_str("leverage pipeline returned zero"),
        }
    }
}

/// Result of the eligibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TradeEligibility {
    Eligible { leverage: Decimal },
    Ineligible { reason: IneligibleReason },
}

impl TradeEligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, TradeEligibility::Eligible { .. })
    }

    /// Approved leverage, zero when ineligible.
    pub fn leverage(&self) -> Decimal {
        match self {
            TradeEligibility::Eligible { leverage } => *leverage,
            TradeEligibility::Ineligible { .. } => Decimal::ZERO,
        }
    }
}

/// Why every position should be closed now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EmergencyReason {
    DailyLoss { daily_pnl_fraction: Decimal },
    EquityFloor { equity: Decimal, floor: Decimal },
    RapidLosses { losses: u32, window_secs: i64 },
}

impl fmt::Display for EmergencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmergencyReason::DailyLoss { daily_pnl_fraction } => {
                write!(f, "daily loss of {:.2}%", daily_pnl_fraction * dec!(100))
            }
            EmergencyReason::EquityFloor { equity, floor } => {
                write!(f, "equity {} below floor {}", equity.round_dp(2), floor.round_dp(2))
            }
            EmergencyReason::RapidLosses { losses, window_secs } => {
                write!(f, "{} losses within {} minutes", losses, window_secs / 60)
            }
        }
    }
}

/// Point-in-time view of the risk state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub equity: Decimal,
    pub initial_equity: Decimal,
    pub peak_equity: Decimal,
    pub drawdown: Decimal,
    pub max_drawdown: Decimal,
    pub win_rate: Decimal,
    pub total_trades: u64,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub daily_pnl_fraction: Decimal,
    pub daily_trades: u32,
    pub weekly_pnl: Decimal,
    pub weekly_pnl_fraction: Decimal,
    pub total_pnl: Decimal,
    pub leverage: Decimal,
    pub cooldown_remaining_secs: Option<i64>,
    pub can_trade: bool,
}

/// Dynamic leverage and circuit breakers for one account.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    initial_equity: Decimal,
    equity: Decimal,
    peak_equity: Decimal,
    max_drawdown_seen: Decimal,
    history: VecDeque<TradeRecord>,
    consecutive_wins: u32,
    consecutive_losses: u32,
    day: PeriodPnl,
    week: PeriodPnl,
    cooldown_until: Option<DateTime<Utc>>,
    total_pnl: Decimal,
    total_trades: u64,
}

impl RiskManager {
    pub fn new(config: RiskConfig, initial_equity: Decimal, now: DateTime<Utc>) -> Self {
        let history = VecDeque::with_capacity(config.history_capacity);
        Self {
            config,
            initial_equity,
            equity: initial_equity,
            peak_equity: initial_equity,
            max_drawdown_seen: Decimal::ZERO,
            history,
            consecutive_wins: 0,
            consecutive_losses: 0,
            day: PeriodPnl::new(day_start(now), initial_equity),
            week: PeriodPnl::new(week_start(now), initial_equity),
            cooldown_until: None,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn roll_periods(&mut self, now: DateTime<Utc>) {
        if self.day.roll(day_start(now), self.equity) {
            debug!(equity = %self.equity, "Daily P&L reset");
        }
        if self.week.roll(week_start(now), self.equity) {
            debug!(equity = %self.equity, "Weekly P&L reset");
        }
    }

    /// Win rate over the most recent `win_rate_lookback` trades, 0.5 with no history.
    pub fn win_rate(&self) -> Decimal {
        let lookback = self.config.win_rate_lookback.min(self.history.len());
        if lookback == 0 {
            return dec!(0.5);
        }
        let wins = self.history.iter().rev().take(lookback).filter(|t| t.is_win()).count();
        Decimal::from(wins as u64) / Decimal::from(lookback as u64)
    }

    /// Current drawdown from peak equity.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity > Decimal::ZERO {
            ((self.peak_equity - self.equity) / self.peak_equity).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    pub fn equity(&self) -> Decimal {
        self.equity
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn consecutive_wins(&self) -> u32 {
        self.consecutive_wins
    }

    pub fn history(&self) -> impl Iterator<Item = &TradeRecord> {
        self.history.iter()
    }

    /// Today's P&L over start-of-day equity.
    pub fn daily_pnl_fraction(&mut self, now: DateTime<Utc>) -> Decimal {
        self.roll_periods(now);
        self.day.fraction()
    }

    /// This week's P&L over start-of-week equity.
    pub fn weekly_pnl_fraction(&mut self, now: DateTime<Utc>) -> Decimal {
        self.roll_periods(now);
        self.week.fraction()
    }

    /// Run the leverage pipeline against the current state.
    pub fn calculate_leverage(&mut self, now: DateTime<Utc>) -> LeverageDecision {
        self.roll_periods(now);
        let inputs = LeverageInputs {
            win_rate: self.win_rate(),
            consecutive_wins: self.consecutive_wins,
            consecutive_losses: self.consecutive_losses,
            daily_pnl_fraction: self.day.fraction(),
            weekly_pnl_fraction: self.week.fraction(),
            drawdown: self.drawdown(),
            max_daily_loss: self.config.limits.max_daily_loss,
            max_drawdown: self.config.limits.max_drawdown,
        };
        calculate_leverage(&self.config.leverage, &inputs)
    }

    /// Eligibility check; the first failing rule wins.
    pub fn can_trade(&mut self, now: DateTime<Utc>) -> TradeEligibility {
        self.roll_periods(now);

        let reason = if let Some(remaining) = self.cooldown_remaining(now) {
            Some(IneligibleReason::Cooldown {
                remaining_secs: remaining,
            })
        } else if self.day.fraction() < -self.config.limits.max_daily_loss {
            Some(IneligibleReason::DailyLossLimit {
                daily_pnl_fraction: self.day.fraction(),
            })
        } else if self.drawdown() > self.config.limits.max_drawdown {
            Some(IneligibleReason::DrawdownLimit {
                drawdown: self.drawdown(),
            })
        } else if self.consecutive_losses >= self.config.limits.max_consecutive_losses {
            Some(IneligibleReason::LossStreak {
                consecutive_losses: self.consecutive_losses,
            })
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!(%reason, "Trading not eligible");
            return TradeEligibility::Ineligible { reason };
        }

        let decision = self.calculate_leverage(now);
        if decision.leverage <= Decimal::ZERO {
            debug!(halt = ?decision.halt, "Trading not eligible: leverage halted");
            return TradeEligibility::Ineligible {
                reason: IneligibleReason::LeverageHalted,
            };
        }
        TradeEligibility::Eligible {
            leverage: decision.leverage,
        }
    }

    fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.cooldown_until
            .filter(|until| now < *until)
            .map(|until| (until - now).num_seconds().max(1))
    }

    /// Record a closed trade.
    pub fn record_trade(&mut self, pnl: Decimal, strategy: StrategyKind, now: DateTime<Utc>) {
        self.roll_periods(now);

        let pnl_fraction = if self.equity > Decimal::ZERO {
            pnl / self.equity
        } else {
            Decimal::ZERO
        };
        let record = TradeRecord {
            pnl,
            pnl_fraction,
            strategy,
            closed_at: now,
        };

        if record.is_win() {
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
        }

        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);

        self.day.record(pnl);
        self.week.record(pnl);
        self.total_pnl += pnl;
        self.total_trades += 1;
        self.apply_equity(self.equity + pnl);

        if pnl < Decimal::ZERO {
            let cooldown = &self.config.cooldown;
            let secs = if self.consecutive_losses >= cooldown.loss_streak_threshold {
                cooldown.after_loss_streak_secs
            } else {
                cooldown.after_loss_secs
            };
            self.cooldown_until = Some(now + Duration::seconds(secs));
        }

        info!(
            %pnl,
            strategy = %strategy,
            equity = %self.equity,
            consecutive_wins = self.consecutive_wins,
            consecutive_losses = self.consecutive_losses,
            "Trade recorded"
        );
    }

    /// Replace the tracked equity with the account's reported equity.
    pub fn update_balance(&mut self, equity: Decimal, now: DateTime<Utc>) {
        self.roll_periods(now);
        self.apply_equity(equity);
    }

    fn apply_equity(&mut self, equity: Decimal) {
        self.equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.max_drawdown_seen = self.max_drawdown_seen.max(self.drawdown());
    }

    /// Whether every position should be liquidated, and why.
    pub fn should_emergency_stop(&mut self, now: DateTime<Utc>) -> Option<EmergencyReason> {
        self.roll_periods(now);
        let cfg = &self.config.emergency;

        let reason = if self.day.fraction() < -cfg.max_daily_loss {
            Some(EmergencyReason::DailyLoss {
                daily_pnl_fraction: self.day.fraction(),
            })
        } else if self.equity < self.initial_equity * cfg.min_equity_ratio {
            Some(EmergencyReason::EquityFloor {
                equity: self.equity,
                floor: self.initial_equity * cfg.min_equity_ratio,
            })
        } else if self.rapid_losses(now) {
            Some(EmergencyReason::RapidLosses {
                losses: cfg.rapid_loss_count,
                window_secs: cfg.rapid_loss_window_secs,
            })
        } else {
            None
        };

        if let Some(reason) = &reason {
            warn!(%reason, "Emergency stop triggered");
        }
        reason
    }

    /// The last `rapid_loss_count` trades are all losses inside the window.
    fn rapid_losses(&self, now: DateTime<Utc>) -> bool {
        let cfg = &self.config.emergency;
        let count = cfg.rapid_loss_count as usize;
        if count == 0 || self.history.len() < count {
            return false;
        }
        let window_start = now - Duration::seconds(cfg.rapid_loss_window_secs);
        self.history
            .iter()
            .rev()
            .take(count)
            .all(|t| !t.is_win() && t.closed_at >= window_start)
    }

    pub fn metrics(&mut self, now: DateTime<Utc>) -> RiskMetrics {
        let eligibility = self.can_trade(now);
        let leverage = self.calculate_leverage(now).leverage;
        RiskMetrics {
            equity: self.equity,
            initial_equity: self.initial_equity,
            peak_equity: self.peak_equity,
            drawdown: self.drawdown(),
            max_drawdown: self.max_drawdown_seen,
            win_rate: self.win_rate(),
            total_trades: self.total_trades,
            consecutive_wins: self.consecutive_wins,
            consecutive_losses: self.consecutive_losses,
            daily_pnl: self.day.pnl,
            daily_pnl_fraction: self.day.fraction(),
            daily_trades: self.day.trades,
            weekly_pnl: self.week.pnl,
            weekly_pnl_fraction: self.week.fraction(),
            total_pnl: self.total_pnl,
            leverage,
            cooldown_remaining_secs: self.cooldown_remaining(now),
            can_trade: eligibility.is_eligible(),
        }
    }

    /// Clear today's P&L, re-based at the current equity.
    pub fn reset_daily(&mut self, now: DateTime<Utc>) {
        self.day = PeriodPnl::new(day_start(now), self.equity);
    }

    /// Clear this week's P&L, re-based at the current equity.
    pub fn reset_weekly(&mut self, now: DateTime<Utc>) {
        self.week = PeriodPnl::new(week_start(now), self.equity);
    }

    /// Forget all history and re-base every reference point at the current equity.
    pub fn reset_all(&mut self, now: DateTime<Utc>) {
        info!(equity = %self.equity, "Risk state reset");
        let equity = self.equity;
        *self = Self::new(self.config.clone(), equity, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        // Wednesday midday
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default(), dec!(1000), t0())
    }

    #[test]
    fn test_fresh_manager_is_eligible_at_base() {
        let mut rm = manager();
        assert_eq!(rm.win_rate(), dec!(0.5));
        assert_eq!(rm.can_trade(t0()), TradeEligibility::Eligible { leverage: dec!(2.0) });
        assert!(rm.should_emergency_stop(t0()).is_none());
    }

    #[test]
    fn test_loss_arms_cooldown() {
        let mut rm = manager();
        rm.record_trade(dec!(-5), StrategyKind::TrendFollowing, t0());

        match rm.can_trade(t0() + Duration::seconds(60)) {
            TradeEligibility::Ineligible {
                reason: IneligibleReason::Cooldown { remaining_secs },
            } => assert_eq!(remaining_secs, 240),
            other => panic!("expected cooldown, got {:?}", other),
        }
        assert!(rm.can_trade(t0() + Duration::seconds(301)).is_eligible());
    }

    #[test]
    fn test_loss_streak_uses_long_cooldown() {
        let mut rm = manager();
        for i in 0..3 {
            rm.record_trade(dec!(-1), StrategyKind::MeanReversion, t0() + Duration::hours(i));
        }
        let last = t0() + Duration::hours(2);
        assert!(!rm.can_trade(last + Duration::seconds(1000)).is_eligible());
        assert!(rm.can_trade(last + Duration::seconds(1801)).is_eligible());
    }

    #[test]
    fn test_three_losses_floor_leverage_despite_high_win_rate() {
        let mut rm = manager();
        let mut now = t0();
        for _ in 0..7 {
            rm.record_trade(dec!(2), StrategyKind::TrendFollowing, now);
            now += Duration::hours(1);
        }
        for _ in 0..3 {
            rm.record_trade(dec!(-1), StrategyKind::TrendFollowing, now);
            now += Duration::hours(1);
        }
        assert_eq!(rm.win_rate(), dec!(0.7));
        assert_eq!(rm.calculate_leverage(now).leverage, dec!(1.0));
    }

    #[test]
    fn test_daily_loss_limit_blocks_and_zeroes_leverage() {
        let mut rm = manager();
        rm.record_trade(dec!(-60), StrategyKind::TrendFollowing, t0());
        let later = t0() + Duration::hours(1);

        assert_eq!(rm.daily_pnl_fraction(later), dec!(-0.06));
        assert!(matches!(
            rm.can_trade(later),
            TradeEligibility::Ineligible {
                reason: IneligibleReason::DailyLossLimit { .. }
            }
        ));
        assert_eq!(rm.calculate_leverage(later).leverage, Decimal::ZERO);
    }

    #[test]
    fn test_cooldown_checked_before_daily_limit() {
        let mut rm = manager();
        rm.record_trade(dec!(-60), StrategyKind::TrendFollowing, t0());
        assert!(matches!(
            rm.can_trade(t0() + Duration::seconds(10)),
            TradeEligibility::Ineligible {
                reason: IneligibleReason::Cooldown { .. }
            }
        ));
    }

    #[test]
    fn test_day_rolls_over_lazily() {
        let mut rm = manager();
        rm.record_trade(dec!(-60), StrategyKind::TrendFollowing, t0());
        let tomorrow = t0() + Duration::days(1);

        assert_eq!(rm.daily_pnl_fraction(tomorrow), Decimal::ZERO);
        // Same ISO week, so the weekly loss is still there
        assert_eq!(rm.weekly_pnl_fraction(tomorrow), dec!(-0.06));
        assert!(rm.can_trade(tomorrow).is_eligible());
    }

    #[test]
    fn test_drawdown_limit() {
        let mut rm = manager();
        rm.update_balance(dec!(1200), t0());
        rm.update_balance(dec!(1010), t0());

        let eligibility = rm.can_trade(t0());
        assert!(matches!(
            eligibility,
            TradeEligibility::Ineligible {
                reason: IneligibleReason::DrawdownLimit { .. }
            }
        ));
        assert!(rm.metrics(t0()).max_drawdown > dec!(0.15));
    }

    #[test]
    fn test_consecutive_loss_cap() {
        let mut rm = manager();
        let mut now = t0();
        for _ in 0..5 {
            rm.record_trade(dec!(-1), StrategyKind::MeanReversion, now);
            now += Duration::hours(1);
        }
        assert_eq!(
            rm.can_trade(now),
            TradeEligibility::Ineligible {
                reason: IneligibleReason::LossStreak { consecutive_losses: 5 }
            }
        );
    }

    #[test]
    fn test_win_then_loss_restores_accumulators() {
        let mut rm = manager();
        let before_day = rm.daily_pnl_fraction(t0());
        let before_week = rm.weekly_pnl_fraction(t0());

        for i in 0..4 {
            rm.record_trade(dec!(12.5), StrategyKind::TrendFollowing, t0() + Duration::minutes(i));
        }
        assert_eq!(rm.consecutive_wins(), 4);
        for i in 4..8 {
            rm.record_trade(dec!(-12.5), StrategyKind::TrendFollowing, t0() + Duration::minutes(i));
        }

        let now = t0() + Duration::minutes(8);
        assert_eq!(rm.daily_pnl_fraction(now), before_day);
        assert_eq!(rm.weekly_pnl_fraction(now), before_week);
        assert_eq!(rm.equity(), dec!(1000));
        assert_eq!(rm.consecutive_wins(), 0);
        assert_eq!(rm.consecutive_losses(), 4);
    }

    #[test]
    fn test_emergency_rapid_losses() {
        let mut rm = manager();
        for i in 0..3 {
            rm.record_trade(dec!(-1), StrategyKind::TrendFollowing, t0() + Duration::minutes(i * 5));
        }
        let now = t0() + Duration::minutes(12);
        assert_eq!(
            rm.should_emergency_stop(now),
            Some(EmergencyReason::RapidLosses {
                losses: 3,
                window_secs: 1800
            })
        );
        // Once the oldest loss leaves the window the condition clears
        assert!(rm.should_emergency_stop(t0() + Duration::minutes(31)).is_none());
    }

    #[test]
    fn test_emergency_daily_loss_and_equity_floor() {
        let mut rm = manager();
        rm.record_trade(dec!(-110), StrategyKind::MeanReversion, t0());
        assert!(matches!(
            rm.should_emergency_stop(t0()),
            Some(EmergencyReason::DailyLoss { .. })
        ));

        let mut rm = manager();
        rm.update_balance(dec!(450), t0());
        assert!(matches!(
            rm.should_emergency_stop(t0()),
            Some(EmergencyReason::EquityFloor { .. })
        ));
    }

    #[test]
    fn test_history_is_bounded() {
        let config = RiskConfig {
            history_capacity: 20,
            ..Default::default()
        };
        let mut rm = RiskManager::new(config, dec!(1000), t0());
        for i in 0..30 {
            rm.record_trade(dec!(1), StrategyKind::TrendFollowing, t0() + Duration::minutes(i));
        }
        assert_eq!(rm.history().count(), 20);
        assert_eq!(rm.metrics(t0() + Duration::minutes(30)).total_trades, 30);
    }

    #[test]
    fn test_metrics_and_reset() {
        let mut rm = manager();
        rm.record_trade(dec!(30), StrategyKind::TrendFollowing, t0());
        let metrics = rm.metrics(t0());
        assert_eq!(metrics.daily_pnl, dec!(30));
        assert_eq!(metrics.daily_pnl_fraction, dec!(0.03));
        assert_eq!(metrics.win_rate, dec!(1));
        assert!(metrics.can_trade);

        rm.reset_daily(t0());
        assert_eq!(rm.daily_pnl_fraction(t0()), Decimal::ZERO);
        assert_eq!(rm.weekly_pnl_fraction(t0()), dec!(0.03));

        rm.reset_all(t0());
        let metrics = rm.metrics(t0());
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.initial_equity, dec!(1030));
        assert_eq!(metrics.win_rate, dec!(0.5));
    }

    #[test]
    fn test_config_validation() {
        assert!(RiskConfig::default().validate().is_ok());

        let mut config = RiskConfig::default();
        config.emergency.max_daily_loss = dec!(0.01);
        assert!(config.validate().is_err());

        let config = RiskConfig {
            history_capacity: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reason_display() {
        let reason = IneligibleReason::DailyLossLimit {
            daily_pnl_fraction: dec!(-0.06),
        };
        assert_eq!(reason.to_string(), "daily loss limit reached (-6.00%)");
    }
}
