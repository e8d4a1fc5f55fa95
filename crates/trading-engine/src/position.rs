//! An open position as tracked by the evaluation loop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::{Direction, PositionContext, Signal, StrategyKind};
use trading_risk::PositionSizeResult;

/// A filled entry and its running P&L state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub context: PositionContext,
    /// Notional in quote currency
    pub size: Decimal,
    pub base_amount: Decimal,
    pub leverage: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl OpenPosition {
    /// A position filled at `entry_price` for a sized signal.
    pub fn open(
        symbol: impl Into<String>,
        signal: Signal,
        entry_price: f64,
        sizing: &PositionSizeResult,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            context: PositionContext::new(signal, entry_price),
            size: sizing.size,
            base_amount: sizing.base_amount,
            leverage: sizing.leverage,
            opened_at,
        }
    }

    pub fn direction(&self) -> Direction {
        self.context.direction()
    }

    pub fn strategy(&self) -> StrategyKind {
        self.context.signal.strategy
    }

    /// Advance one cycle at the latest price.
    pub fn mark(&mut self, price: f64) {
        self.context.mark(price);
    }

    /// Unrealized P&L in quote currency at the last mark.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.pnl_at(self.context.pnl_fraction)
    }

    /// P&L in quote currency if closed at `price`.
    pub fn pnl_if_closed_at(&self, price: f64) -> Decimal {
        self.pnl_at(self.direction().pnl_fraction(self.context.entry_price, price))
    }

    fn pnl_at(&self, fraction: f64) -> Decimal {
        Decimal::try_from(fraction).map_or(Decimal::ZERO, |f| (self.size * f).round_dp(8))
    }
}
