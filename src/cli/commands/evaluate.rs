//! Evaluate command: one decision cycle per symbol over CSV bars.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use trading_config::{AppConfig, TimeframeSettings};
use trading_engine::{AccountFacts, CycleOutcome, SymbolEvaluator};
use trading_indicators::IndicatorEngine;
use trading_monitor::{log_outcome, log_risk_summary, OutcomeTally};
use trading_regime::RegimeClassifierFactory;
use trading_risk::{PositionSizer, RiskMetrics, SharedRiskManager};
use trading_strategies::SignalReadiness;
use trading_strategies::StrategySet;

use crate::cli::bars::load_series;
use crate::cli::{EvaluateArgs, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
enum SymbolStatus {
    Evaluated { outcome: CycleOutcome },
    /// Not enough history yet; retry next cycle
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
struct SymbolReport {
    symbol: String,
    #[serde(flatten)]
    status: SymbolStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    readiness: Vec<SignalReadiness>,
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    evaluated_at: DateTime<Utc>,
    symbols: Vec<SymbolReport>,
    tally: OutcomeTally,
    risk: RiskMetrics,
}

pub async fn run(args: EvaluateArgs, config: AppConfig) -> Result<()> {
    let now = args.at.unwrap_or_else(Utc::now);
    let symbols = if args.symbols.is_empty() {
        config.app.symbols.clone()
    } else {
        args.symbols.clone()
    };
    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.app.data_dir.clone());
    let equity = args.equity.unwrap_or(config.app.initial_equity);
    let account = AccountFacts {
        equity,
        available_balance: args.available.unwrap_or(equity),
    };
    info!(symbols = symbols.len(), data_dir = %data_dir.display(), %equity, "Starting evaluation");

    let engine = Arc::new(IndicatorEngine::new(config.indicators.clone()).context("Invalid indicator configuration")?);
    let strategies = Arc::new(
        StrategySet::new(config.trend_following.clone(), config.mean_reversion.clone())
            .context("Invalid strategy configuration")?,
    );
    let factory = RegimeClassifierFactory::new(config.regime.clone()).context("Invalid regime configuration")?;
    let risk = SharedRiskManager::with_config(config.risk.clone(), config.app.initial_equity, now);
    if equity != config.app.initial_equity {
        risk.update_balance(equity, now);
    }
    let sizer = PositionSizer::new(config.sizing.clone());

    let mut tasks = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let evaluator = SymbolEvaluator::new(
            factory.create(&symbol),
            Arc::clone(&engine),
            Arc::clone(&strategies),
            risk.clone(),
            sizer.clone(),
            config.stops.clone(),
        );
        let job = Job {
            dir: data_dir.clone(),
            timeframes: config.timeframes.clone(),
            account,
            readiness: args.readiness,
            now,
        };
        tasks.push(tokio::task::spawn_blocking(move || job.run(evaluator)));
    }

    let mut reports = Vec::with_capacity(tasks.len());
    let mut tally = OutcomeTally::default();
    for task in tasks {
        let report = task.await.context("Evaluation task failed")?;
        if let SymbolStatus::Evaluated { outcome } = &report.status {
            log_outcome(&report.symbol, outcome);
            tally.record(outcome);
        }
        reports.push(report);
    }

    let metrics = risk.metrics(now);
    log_risk_summary(&metrics);

    let report = EvaluationReport {
        evaluated_at: now,
        symbols: reports,
        tally,
        risk: metrics,
    };
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

struct Job {
    dir: PathBuf,
    timeframes: TimeframeSettings,
    account: AccountFacts,
    readiness: bool,
    now: DateTime<Utc>,
}

impl Job {
    fn run(self, mut evaluator: SymbolEvaluator) -> SymbolReport {
        let symbol = evaluator.symbol().to_string();
        let capacity = self.timeframes.candle_count;
        let loaded = load_series(&self.dir, &symbol, self.timeframes.fast, capacity)
            .and_then(|fast| Ok((fast, load_series(&self.dir, &symbol, self.timeframes.slow, capacity)?)));
        let (fast, slow) = match loaded {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to load bars");
                return SymbolReport {
                    symbol,
                    status: SymbolStatus::Failed { error: e.to_string() },
                    readiness: Vec::new(),
                };
            }
        };

        let readiness = if self.readiness {
            match evaluator.readiness(&fast, &slow) {
                Ok(readiness) => readiness,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Readiness check failed");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let status = match evaluator.evaluate(&fast, &slow, self.account, None, self.now) {
            Ok(outcome) => SymbolStatus::Evaluated { outcome },
            Err(e) if e.is_recoverable() => {
                info!(symbol = %symbol, reason = %e, "Skipping symbol");
                SymbolStatus::Skipped { reason: e.to_string() }
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Evaluation failed");
                SymbolStatus::Failed { error: e.to_string() }
            }
        };
        SymbolReport {
            symbol,
            status,
            readiness,
        }
    }
}

fn print_text(report: &EvaluationReport) {
    println!("Evaluation at {}", report.evaluated_at.to_rfc3339());
    println!("═══════════════════════════════════════════════════════════");
    for symbol in &report.symbols {
        println!("  {:<12} {}", symbol.symbol, describe(&symbol.status));
        for readiness in &symbol.readiness {
            println!("      {}", readiness);
        }
    }
    println!();

    let counts: Vec<String> = report.tally.iter().map(|(label, n)| format!("{}={}", label, n)).collect();
    if !counts.is_empty() {
        println!("Outcomes: {}", counts.join(" "));
    }
    let risk = &report.risk;
    println!(
        "Equity {} | drawdown {} | leverage {}x | can trade: {}",
        risk.equity,
        risk.drawdown.round_dp(4),
        risk.leverage,
        risk.can_trade
    );
}

fn describe(status: &SymbolStatus) -> String {
    let outcome = match status {
        SymbolStatus::Evaluated { outcome } => outcome,
        SymbolStatus::Skipped { reason } => return format!("skipped: {}", reason),
        SymbolStatus::Failed { error } => return format!("failed: {}", error),
    };
    match outcome {
        CycleOutcome::EmergencyStop { reason } => format!("EMERGENCY STOP: {}", reason),
        CycleOutcome::Ineligible { reason } => format!("ineligible: {}", reason),
        CycleOutcome::Exit { reason, .. } => format!("exit: {}", reason),
        CycleOutcome::Hold { regime } => format!("hold ({})", regime.regime),
        CycleOutcome::Enter { signal, sizing, regime } => format!(
            "ENTER {} via {} ({}): entry {:.4} stop {:.4} target {:.4} rr {:.2} size {} at {}x",
            signal.direction,
            signal.strategy,
            regime.regime,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            signal.risk_reward_ratio,
            sizing.size.round_dp(2),
            sizing.leverage
        ),
        CycleOutcome::NoSignal { regime } => {
            format!("no signal ({}, confidence {:.2})", regime.regime, regime.confidence)
        }
        CycleOutcome::StopRejected { signal, issue } => format!("{} signal rejected: {}", signal.strategy, issue),
        CycleOutcome::SizingRejected { signal, rejection } => {
            format!("{} signal rejected: {}", signal.strategy, rejection)
        }
    }
}
