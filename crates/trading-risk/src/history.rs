//! Trade records and day/week P&L accumulators.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::StrategyKind;

/// One closed trade as seen by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub pnl: Decimal,
    /// P&L over the equity just before the trade closed
    pub pnl_fraction: Decimal,
    pub strategy: StrategyKind,
    pub closed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Strictly positive P&L; breakeven counts against the streak.
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// Start of the UTC day containing `now`.
pub(crate) fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Start of the ISO week (Monday 00:00 UTC) containing `now`.
pub(crate) fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) - Duration::days(i64::from(now.weekday().num_days_from_monday()))
}

/// P&L accumulated since `start`, measured against the equity at `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PeriodPnl {
    pub start: DateTime<Utc>,
    pub start_equity: Decimal,
    pub pnl: Decimal,
    pub trades: u32,
}

impl PeriodPnl {
    pub fn new(start: DateTime<Utc>, start_equity: Decimal) -> Self {
        Self {
            start,
            start_equity,
            pnl: Decimal::ZERO,
            trades: 0,
        }
    }

    pub fn record(&mut self, pnl: Decimal) {
        self.pnl += pnl;
        self.trades += 1;
    }

    pub fn fraction(&self) -> Decimal {
        if self.start_equity > Decimal::ZERO {
            self.pnl / self.start_equity
        } else {
            Decimal::ZERO
        }
    }

    /// Start a new period if `period_start` is later than the current one.
    /// Returns true when the period rolled.
    pub fn roll(&mut self, period_start: DateTime<Utc>, equity: Decimal) -> bool {
        if period_start > self.start {
            *self = Self::new(period_start, equity);
            true
        } else {
            false
        }
    }
}
