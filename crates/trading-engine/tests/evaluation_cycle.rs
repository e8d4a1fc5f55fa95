//! End-to-end cycles over synthetic bars.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use trading_core::error::IndicatorError;
use trading_core::{
    Bar, BarSeries, Direction, ExitReason, MarketRegime, Signal, StopTarget, StrategyKind, Timeframe,
};
use trading_engine::{AccountFacts, CycleOutcome, OpenPosition, SymbolEvaluator};
use trading_indicators::{IndicatorConfig, IndicatorEngine};
use trading_regime::RegimeClassifierFactory;
use trading_risk::{
    IneligibleReason, PositionSizeResult, PositionSizer, RiskConfig, SharedRiskManager, SizingConfig, StopIssue,
    StopValidationConfig,
};
use trading_strategies::StrategySet;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

fn trending_series(timeframe: Timeframe, count: usize, step: f64) -> BarSeries {
    let mut series = BarSeries::new("BTCUSDT", timeframe);
    let interval = timeframe.as_millis();
    for i in 0..count {
        let wobble = ((i as f64) * 0.7).sin() * 0.3;
        let close = 100.0 + step * i as f64 + wobble;
        let open = close - step * 0.5;
        series
            .push(Bar::new(i as i64 * interval, open, close + 0.6, open - 0.6, close, 1_000.0))
            .unwrap();
    }
    series
}

fn bars(count: usize) -> (BarSeries, BarSeries) {
    (
        trending_series(Timeframe::Minute5, count, 0.4),
        trending_series(Timeframe::Minute15, count, 1.2),
    )
}

/// Flat at 100 for 80 bars, then 20 closes each `step` lower, every bar
/// `spread` either side of its close. The slow series stays flat so ADX is 0.
fn reversion_setup(step: f64, spread: f64) -> (BarSeries, BarSeries) {
    let mut fast = BarSeries::new("BTCUSDT", Timeframe::Minute5);
    let mut slow = BarSeries::new("BTCUSDT", Timeframe::Minute15);
    for i in 0..100usize {
        let close = if i < 80 { 100.0 } else { 100.0 - step * (i - 79) as f64 };
        fast.push(Bar::new(
            i as i64 * Timeframe::Minute5.as_millis(),
            close,
            close + spread,
            close - spread,
            close,
            1_000.0,
        ))
        .unwrap();
        slow.push(Bar::new(
            i as i64 * Timeframe::Minute15.as_millis(),
            100.0,
            100.5,
            99.5,
            100.0,
            1_000.0,
        ))
        .unwrap();
    }
    (fast, slow)
}

fn evaluator(risk: SharedRiskManager) -> SymbolEvaluator {
    evaluator_with_stops(risk, StopValidationConfig::default())
}

fn evaluator_with_stops(risk: SharedRiskManager, stops: StopValidationConfig) -> SymbolEvaluator {
    let engine = Arc::new(IndicatorEngine::new(IndicatorConfig::default()).unwrap());
    let classifier = RegimeClassifierFactory::default().create("BTCUSDT");
    SymbolEvaluator::new(
        classifier,
        engine,
        Arc::new(StrategySet::default()),
        risk,
        PositionSizer::new(SizingConfig::default()),
        stops,
    )
}

fn fresh_risk() -> SharedRiskManager {
    SharedRiskManager::with_config(RiskConfig::default(), dec!(1000), now())
}

fn account() -> AccountFacts {
    AccountFacts {
        equity: dec!(1000),
        available_balance: dec!(1000),
    }
}

fn open_position(strategy: StrategyKind, entry: f64, stop: f64, target: f64, cycles: u32) -> OpenPosition {
    let stops = StopTarget::new(Direction::Long, entry, stop, target);
    let signal = Signal::new(strategy, &stops, "test entry", 0);
    let sizing = PositionSizeResult {
        size: dec!(500),
        base_amount: dec!(5),
        leverage: dec!(2),
        risk_amount: dec!(20),
        stop_distance: dec!(1),
        stop_distance_fraction: dec!(0.01),
        leveraged_value: dec!(500),
        rejection: None,
    };
    let mut position = OpenPosition::open("BTCUSDT", signal, entry, &sizing, now());
    position.context.cycles_held = cycles;
    position
}

#[test]
fn test_short_history_is_an_error() {
    let mut evaluator = evaluator(fresh_risk());
    let (fast, slow) = bars(30);
    let result = evaluator.evaluate(&fast, &slow, account(), None, now());
    assert!(matches!(result, Err(IndicatorError::InsufficientBars { .. })));
}

#[test]
fn test_emergency_stop_checked_before_data() {
    let risk = fresh_risk();
    risk.update_balance(dec!(400), now());
    let mut evaluator = evaluator(risk);

    let (fast, slow) = bars(30);
    let outcome = evaluator.evaluate(&fast, &slow, account(), None, now()).unwrap();
    assert!(matches!(outcome, CycleOutcome::EmergencyStop { .. }));
}

#[test]
fn test_ineligible_account_skips_cycle() {
    let risk = fresh_risk();
    risk.record_trade(dec!(-10), StrategyKind::TrendFollowing, now());
    let mut evaluator = evaluator(risk);

    let (fast, slow) = bars(30);
    let outcome = evaluator.evaluate(&fast, &slow, account(), None, now()).unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Ineligible {
            reason: IneligibleReason::Cooldown { .. }
        }
    ));
    // The classifier never saw a snapshot
    assert_eq!(evaluator.classifier().regime_duration(), 0);
}

#[test]
fn test_open_position_stopped_out_during_cooldown() {
    let risk = fresh_risk();
    risk.record_trade(dec!(-10), StrategyKind::MeanReversion, now());
    let mut evaluator = evaluator(risk.clone());

    let (fast, slow) = bars(120);
    let last = fast.last().unwrap().close;
    let mut position = open_position(StrategyKind::TrendFollowing, last * 1.2, last * 1.1, last * 1.5, 0);

    let outcome = evaluator
        .evaluate(&fast, &slow, account(), Some(&mut position), now())
        .unwrap();
    match outcome {
        CycleOutcome::Exit { reason, .. } => assert!(matches!(reason, ExitReason::StopLoss { .. })),
        other => panic!("expected a stop-loss exit, got {}", other.label()),
    }
    assert_eq!(position.context.cycles_held, 1);

    let pnl = evaluator.record_close(&position, last, now());
    assert!(pnl < Decimal::ZERO);
    assert_eq!(risk.metrics(now()).total_trades, 2);
}

#[test]
fn test_reversion_position_time_boxed() {
    let mut evaluator = evaluator(fresh_risk());
    let (fast, slow) = bars(120);
    let last = fast.last().unwrap().close;
    let mut position = open_position(StrategyKind::MeanReversion, last, last * 0.5, last * 2.0, 16);

    let outcome = evaluator
        .evaluate(&fast, &slow, account(), Some(&mut position), now())
        .unwrap();
    match outcome {
        CycleOutcome::Exit { reason, .. } => assert_eq!(
            reason,
            ExitReason::TimeLimit {
                cycles_held: 17,
                max_cycles: 16
            }
        ),
        other => panic!("expected a time-limit exit, got {}", other.label()),
    }
}

#[test]
fn test_trend_position_held_inside_levels() {
    let mut evaluator = evaluator(fresh_risk());
    let (fast, slow) = bars(120);
    let last = fast.last().unwrap().close;
    let mut position = open_position(StrategyKind::TrendFollowing, last, last * 0.9, last * 1.2, 3);

    let outcome = evaluator
        .evaluate(&fast, &slow, account(), Some(&mut position), now())
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Hold { .. }));
}

#[test]
fn test_flat_cycle_outcome_is_consistent() {
    let mut evaluator = evaluator(fresh_risk());
    let (fast, slow) = bars(120);
    let last_ts = fast.last().unwrap().timestamp;

    let outcome = evaluator.evaluate(&fast, &slow, account(), None, now()).unwrap();
    match &outcome {
        CycleOutcome::Enter { signal, sizing, regime } => {
            assert_eq!(signal.timestamp, last_ts);
            assert!(sizing.is_tradable());
            assert!(signal.risk_reward_ratio >= 1.1);
            assert!(sizing.size <= dec!(1000) * sizing.leverage);
            assert!(regime.confidence >= 0.0 && regime.confidence <= 1.0);
        }
        CycleOutcome::NoSignal { .. }
        | CycleOutcome::StopRejected { .. }
        | CycleOutcome::SizingRejected { .. } => {}
        other => panic!("unexpected outcome {}", other.label()),
    }
    assert_eq!(evaluator.classifier().regime_duration(), 1);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], outcome.label());
}

#[test]
fn test_readiness_does_not_advance_classifier() {
    let evaluator = evaluator(fresh_risk());
    let (fast, slow) = bars(120);
    let readiness = evaluator.readiness(&fast, &slow).unwrap();
    assert_eq!(readiness.len(), 4);
    assert_eq!(evaluator.classifier().regime_duration(), 0);
}

#[test]
fn test_oversold_range_enters_reversion_long() {
    let mut evaluator = evaluator(fresh_risk());
    let (fast, slow) = reversion_setup(0.3, 0.2);
    let account = AccountFacts {
        equity: dec!(1000),
        available_balance: dec!(1000),
    };

    let outcome = evaluator.evaluate(&fast, &slow, account, None, now()).unwrap();
    let CycleOutcome::Enter { signal, sizing, regime } = outcome else {
        panic!("expected entry, got {}", outcome.label());
    };

    assert_eq!(regime.regime, MarketRegime::Ranging);
    assert_eq!(signal.strategy, StrategyKind::MeanReversion);
    assert_eq!(signal.direction, Direction::Long);
    assert!((signal.entry_price - 94.0).abs() < 1e-10);
    // Middle band is the mean of the last 20 closes
    assert!((signal.take_profit - 96.85).abs() < 1e-9);
    assert!(signal.stop_loss < signal.entry_price);
    assert!(signal.risk_reward_ratio >= 1.1);
    assert_eq!(signal.timestamp, fast.last().unwrap().timestamp);

    // Capped at half of leveraged equity
    assert_eq!(sizing.leverage, dec!(2));
    assert_eq!(sizing.size, dec!(1000));
    assert!(sizing.is_tradable());
    assert!(sizing.size / sizing.leverage <= account.available_balance);
    assert!(sizing.stop_distance_fraction > dec!(0.005) && sizing.stop_distance_fraction < dec!(0.10));
}

#[test]
fn test_tight_reversion_stop_rejected() {
    let mut evaluator = evaluator(fresh_risk());
    // ATR near 0.18 puts the stop about 0.28% from entry
    let (fast, slow) = reversion_setup(0.2, 0.02);

    let outcome = evaluator.evaluate(&fast, &slow, account(), None, now()).unwrap();
    match outcome {
        CycleOutcome::StopRejected { signal, issue } => {
            assert_eq!(signal.strategy, StrategyKind::MeanReversion);
            assert!(matches!(issue, StopIssue::TooClose { distance, min } if distance < min && (min - 0.005).abs() < 1e-10));
        }
        other => panic!("expected stop rejection, got {}", other.label()),
    }
}

#[test]
fn test_wide_stop_rejected_by_validation_bounds() {
    let stops = StopValidationConfig {
        min_distance: 0.001,
        max_distance: 0.005,
    };
    let mut evaluator = evaluator_with_stops(fresh_risk(), stops);
    let (fast, slow) = reversion_setup(0.3, 0.2);

    let outcome = evaluator.evaluate(&fast, &slow, account(), None, now()).unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::StopRejected {
            issue: StopIssue::TooFar { .. },
            ..
        }
    ));
}
