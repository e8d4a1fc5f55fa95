//! Structured log lines for cycle outcomes and account risk.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use trading_engine::CycleOutcome;
use trading_risk::RiskMetrics;

/// Log one cycle outcome at the level its kind deserves.
pub fn log_outcome(symbol: &str, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::EmergencyStop { reason } => {
            warn!(symbol, %reason, "Emergency stop, liquidate all positions");
        }
        CycleOutcome::Ineligible { reason } => debug!(symbol, %reason, "Not eligible to trade"),
        CycleOutcome::Exit { reason, regime } => {
            info!(symbol, %reason, regime = %regime.regime, "Close position");
        }
        CycleOutcome::Hold { regime } => debug!(symbol, regime = %regime.regime, "Hold position"),
        CycleOutcome::Enter { signal, sizing, regime } => info!(
            symbol,
            direction = %signal.direction,
            strategy = %signal.strategy,
            regime = %regime.regime,
            entry = signal.entry_price,
            stop = signal.stop_loss,
            target = signal.take_profit,
            risk_reward = signal.risk_reward_ratio,
            size = %sizing.size,
            leverage = %sizing.leverage,
            "Open position"
        ),
        CycleOutcome::NoSignal { regime } => debug!(
            symbol,
            regime = %regime.regime,
            confidence = regime.confidence,
            "No entry signal"
        ),
        CycleOutcome::StopRejected { signal, issue } => {
            info!(symbol, strategy = %signal.strategy, %issue, "Signal rejected by stop validation");
        }
        CycleOutcome::SizingRejected { signal, rejection } => {
            info!(symbol, strategy = %signal.strategy, %rejection, "Signal rejected by position sizer");
        }
    }
}

/// Account-level risk summary.
pub fn log_risk_summary(metrics: &RiskMetrics) {
    info!(
        equity = %metrics.equity,
        drawdown = %metrics.drawdown,
        win_rate = %metrics.win_rate,
        trades = metrics.total_trades,
        consecutive_losses = metrics.consecutive_losses,
        daily_pnl = %metrics.daily_pnl,
        weekly_pnl = %metrics.weekly_pnl,
        leverage = %metrics.leverage,
        can_trade = metrics.can_trade,
        "Risk summary"
    );
    if let Some(remaining) = metrics.cooldown_remaining_secs {
        info!(remaining_secs = remaining, "Cooldown active");
    }
}

/// Counts of outcomes by label across a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutcomeTally {
    counts: BTreeMap<&'static str, usize>,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: &CycleOutcome) {
        *self.counts.entry(outcome.label()).or_default() += 1;
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(label, count)| (*label, *count))
    }
}
