//! The per-symbol evaluation cycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::IndicatorError;
use trading_core::{BarSeries, ExitReason, IndicatorSnapshot, RegimeState, Signal};
use trading_indicators::IndicatorEngine;
use trading_regime::RegimeClassifier;
use trading_risk::{
    validate_stop_loss, EmergencyReason, IneligibleReason, PositionSizeResult, PositionSizer,
    SharedRiskManager, SizingRejection, StopIssue, StopValidationConfig, TradeEligibility,
};
use trading_strategies::{SignalReadiness, StrategySet};

use crate::position::OpenPosition;

/// Account numbers supplied by the caller each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountFacts {
    pub equity: Decimal,
    pub available_balance: Decimal,
}

/// What one cycle decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CycleOutcome {
    /// Liquidate everything.
    EmergencyStop { reason: EmergencyReason },
    /// Trading is paused; no signal was evaluated.
    Ineligible { reason: IneligibleReason },
    /// Close the open position.
    Exit { reason: ExitReason, regime: RegimeState },
    /// Keep the open position.
    Hold { regime: RegimeState },
    /// Open a position.
    Enter {
        signal: Signal,
        sizing: PositionSizeResult,
        regime: RegimeState,
    },
    NoSignal { regime: RegimeState },
    StopRejected { signal: Signal, issue: StopIssue },
    SizingRejected { signal: Signal, rejection: SizingRejection },
}

impl CycleOutcome {
    /// Short label for logs and tables.
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::EmergencyStop { .. } => "emergency_stop",
            CycleOutcome::Ineligible { .. } => "ineligible",
            CycleOutcome::Exit { .. } => "exit",
            CycleOutcome::Hold { .. } => "hold",
            CycleOutcome::Enter { .. } => "enter",
            CycleOutcome::NoSignal { .. } => "no_signal",
            CycleOutcome::StopRejected { .. } => "stop_rejected",
            CycleOutcome::SizingRejected { .. } => "sizing_rejected",
        }
    }
}

/// Runs the cycle for one symbol.
pub struct SymbolEvaluator {
    symbol: String,
    engine: Arc<IndicatorEngine>,
    classifier: RegimeClassifier,
    strategies: Arc<StrategySet>,
    risk: SharedRiskManager,
    sizer: PositionSizer,
    stop_validation: StopValidationConfig,
}

impl SymbolEvaluator {
    pub fn new(
        classifier: RegimeClassifier,
        engine: Arc<IndicatorEngine>,
        strategies: Arc<StrategySet>,
        risk: SharedRiskManager,
        sizer: PositionSizer,
        stop_validation: StopValidationConfig,
    ) -> Self {
        Self {
            symbol: classifier.symbol().to_string(),
            engine,
            classifier,
            strategies,
            risk,
            sizer,
            stop_validation,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn classifier(&self) -> &RegimeClassifier {
        &self.classifier
    }

    pub fn risk(&self) -> &SharedRiskManager {
        &self.risk
    }

    /// Run one cycle.
    ///
    /// The emergency stop is checked first. Without an open position an
    /// ineligible account ends the cycle before any indicator work; with one,
    /// exits are still evaluated. Indicator errors propagate: insufficient
    /// data means skip this cycle, an invalid price fails it.
    pub fn evaluate(
        &mut self,
        fast: &BarSeries,
        slow: &BarSeries,
        account: AccountFacts,
        position: Option<&mut OpenPosition>,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome, IndicatorError> {
        let assessment = self.risk.assess(now);
        if let Some(reason) = assessment.emergency {
            warn!(symbol = %self.symbol, %reason, "Emergency stop");
            return Ok(CycleOutcome::EmergencyStop { reason });
        }

        if position.is_none() {
            if let TradeEligibility::Ineligible { reason } = assessment.eligibility {
                debug!(symbol = %self.symbol, %reason, "Skipping cycle");
                return Ok(CycleOutcome::Ineligible { reason });
            }
        }

        let snapshot = self.engine.compute(fast, slow)?;
        let regime = self.classifier.classify(&snapshot);

        if let Some(position) = position {
            return Ok(self.check_exit(&snapshot, regime, position));
        }

        let Some(strategy) = self.strategies.select(&regime) else {
            return Ok(CycleOutcome::NoSignal { regime });
        };
        let Some(signal) = strategy.check_entry(&snapshot, &regime) else {
            return Ok(CycleOutcome::NoSignal { regime });
        };

        let validation =
            validate_stop_loss(signal.entry_price, signal.stop_loss, signal.direction, &self.stop_validation);
        if let Some(issue) = validation.reason {
            debug!(symbol = %self.symbol, %issue, "Signal vetoed by stop validation");
            return Ok(CycleOutcome::StopRejected { signal, issue });
        }

        let sizing = self.sizer.calculate(
            account.equity,
            account.available_balance,
            signal.entry_price,
            signal.stop_loss,
            signal.strength,
            assessment.eligibility.leverage(),
        );
        if !sizing.is_tradable() {
            let rejection = sizing.rejection.unwrap_or(SizingRejection::BelowMinimumNotional);
            debug!(symbol = %self.symbol, %rejection, "Signal sized to zero");
            return Ok(CycleOutcome::SizingRejected { signal, rejection });
        }

        info!(
            symbol = %self.symbol,
            direction = %signal.direction,
            strategy = %signal.strategy,
            entry = signal.entry_price,
            stop = signal.stop_loss,
            target = signal.take_profit,
            size = %sizing.size,
            leverage = %sizing.leverage,
            "Entry signal"
        );
        Ok(CycleOutcome::Enter { signal, sizing, regime })
    }

    fn check_exit(
        &self,
        snapshot: &IndicatorSnapshot,
        regime: RegimeState,
        position: &mut OpenPosition,
    ) -> CycleOutcome {
        position.mark(snapshot.current_price);
        let strategy = self.strategies.get(position.strategy());
        match strategy.check_exit(snapshot, &position.context) {
            Some(reason) => {
                info!(
                    symbol = %self.symbol,
                    %reason,
                    pnl = %position.unrealized_pnl(),
                    cycles = position.context.cycles_held,
                    "Exit signal"
                );
                CycleOutcome::Exit { reason, regime }
            }
            None => CycleOutcome::Hold { regime },
        }
    }

    /// Record a closed position with the risk manager. Returns the realized P&L.
    pub fn record_close(&self, position: &OpenPosition, exit_price: f64, now: DateTime<Utc>) -> Decimal {
        let pnl = position.pnl_if_closed_at(exit_price);
        self.risk.record_trade(pnl, position.strategy(), now);
        pnl
    }

    /// Entry checklists for the current bars, without touching the regime
    /// classifier's history.
    pub fn readiness(&self, fast: &BarSeries, slow: &BarSeries) -> Result<Vec<SignalReadiness>, IndicatorError> {
        let snapshot = self.engine.compute(fast, slow)?;
        let regime = self.classifier.clone().classify(&snapshot);
        Ok(self.strategies.readiness(&snapshot, &regime))
    }
}
