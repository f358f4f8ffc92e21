use goldsignal::confirmation::ConfirmationSource;
use goldsignal::risk::RiskContext;
use goldsignal::signal::{Outcome, RejectionReason, SignalQuality};
use goldsignal::*;

const ENTRY: f64 = 2000.0;

fn engine() -> SignalEngine {
    SignalEngine::new(EngineConfig::default()).unwrap()
}

fn quiet_cycle() -> CycleInput {
    CycleInput {
        snapshots: Timeframe::ALL
            .iter()
            .map(|&tf| TimeframeSnapshot::neutral(tf, ENTRY))
            .collect(),
        risk: RiskContext::new(10000.0, 2.0),
        news: None,
    }
}

fn snapshot_mut(input: &mut CycleInput, tf: Timeframe) -> &mut TimeframeSnapshot {
    input
        .snapshots
        .iter_mut()
        .find(|s| s.timeframe == tf)
        .unwrap()
}

/// 1d up (3.0), 4h up (2.0), 1h bullish momentum (1.0)
fn aligned_bullish_cycle() -> CycleInput {
    let mut input = quiet_cycle();
    snapshot_mut(&mut input, Timeframe::D1).trend_direction = TrendDirection::Up;
    snapshot_mut(&mut input, Timeframe::H4).trend_direction = TrendDirection::Up;
    snapshot_mut(&mut input, Timeframe::H1).momentum = MomentumState {
        rsi: 60.0,
        macd_histogram: 0.5,
    };
    input
}

fn rejection_reasons(outcome: &Outcome) -> Vec<RejectionReason> {
    outcome
        .rejection()
        .expect("expected a rejection")
        .reasons
        .iter()
        .copied()
        .collect()
}

#[test]
fn test_aligned_higher_timeframes_produce_bullish_signal() {
    let _ = tracing_subscriber::fmt::try_init();

    let outcome = engine().evaluate(&aligned_bullish_cycle()).unwrap();
    let signal = outcome.signal().expect("expected a signal");

    assert_eq!(signal.direction, Direction::Bullish);
    assert_eq!(signal.confidence_score, 1.0);
    assert_eq!(signal.entry_price, ENTRY);
    assert_eq!(signal.confirmations_used.len(), 3);
    assert_eq!(
        signal.confirmations_used[0].source,
        ConfirmationSource::Trend
    );
    assert_eq!(signal.confirmations_used[0].timeframe, Some(Timeframe::D1));

    // No S/R levels: default 300-pip stop at 1997.00 sits on a whole dollar,
    // so it is pushed 20 pips past it
    assert!((signal.stop_price - 1996.80).abs() < 1e-9);
    assert!((signal.stop_distance_pips - 320.0).abs() < 1e-6);
    assert!(signal.stop_price < signal.entry_price);
    assert!(signal.risk_reward_ratio >= 2.0);
    assert_eq!(signal.target_prices.len(), 3);
    assert!(signal
        .target_prices
        .windows(2)
        .all(|w| w[1] > w[0]));
    assert!(signal.target_prices[0] > signal.entry_price);

    // $200 / ($3.20 * 100) = 0.625 -> 0.62
    assert_eq!(signal.position_size_lots, 0.62);
    assert!(signal.risk_amount <= 200.0);
}

#[test]
fn test_two_confirmations_are_insufficient() {
    let mut input = quiet_cycle();
    snapshot_mut(&mut input, Timeframe::D1).trend_direction = TrendDirection::Up;
    snapshot_mut(&mut input, Timeframe::H4).trend_direction = TrendDirection::Up;

    let outcome = engine().evaluate(&input).unwrap();
    assert_eq!(
        rejection_reasons(&outcome),
        vec![RejectionReason::InsufficientConfirmations]
    );
    assert_eq!(outcome.rejection().unwrap().confirmation_count, 2);
}

#[test]
fn test_trade_cap_blocks_an_otherwise_valid_signal() {
    let mut input = aligned_bullish_cycle();
    input.risk.trades_today = 5;
    input.risk.max_daily_trades = 5;

    let outcome = engine().evaluate(&input).unwrap();
    assert_eq!(
        rejection_reasons(&outcome),
        vec![RejectionReason::DailyTradeCapReached]
    );
}

#[test]
fn test_daily_loss_cap_blocks_signal() {
    let mut input = aligned_bullish_cycle();
    input.risk.daily_pnl_percent = -5.0;

    let outcome = engine().evaluate(&input).unwrap();
    assert_eq!(
        rejection_reasons(&outcome),
        vec![RejectionReason::DailyLossCapReached]
    );
}

#[test]
fn test_tight_support_stop_is_pushed_to_minimum_distance() {
    let mut input = aligned_bullish_cycle();
    // Support 80 pips under entry
    snapshot_mut(&mut input, Timeframe::H1).support_resistance_levels = vec![1999.20];

    let outcome = engine().evaluate(&input).unwrap();
    let signal = outcome.signal().expect("expected a signal");

    assert!((signal.stop_price - 1998.50).abs() < 1e-9);
    assert!((signal.stop_distance_pips - 150.0).abs() < 1e-6);
    assert!((signal.target_prices[0] - 2003.0).abs() < 1e-9);
    assert_eq!(signal.risk_reward_ratio, 2.0);
    // $200 / ($1.50 * 100) = 1.333 -> 1.33
    assert_eq!(signal.position_size_lots, 1.33);
}

#[test]
fn test_higher_timeframe_disagreement_is_a_conflict() {
    let mut input = quiet_cycle();
    snapshot_mut(&mut input, Timeframe::D1).trend_direction = TrendDirection::Up;
    snapshot_mut(&mut input, Timeframe::H4).trend_direction = TrendDirection::Down;
    snapshot_mut(&mut input, Timeframe::H1).trend_direction = TrendDirection::Down;
    snapshot_mut(&mut input, Timeframe::M15).momentum.rsi = 38.0;

    // Bearish 4.5 vs bullish 3.0: ratio 0.67
    let outcome = engine().evaluate(&input).unwrap();
    assert_eq!(
        rejection_reasons(&outcome),
        vec![RejectionReason::DirectionalConflict]
    );
}

#[test]
fn test_resistance_short_of_first_target_rejects_on_risk_reward() {
    let mut input = aligned_bullish_cycle();
    // Stop at 1997.40 (260 pips) needs 2005.20 for 2R; resistance at 2001.40 comes first
    snapshot_mut(&mut input, Timeframe::H4).support_resistance_levels = vec![1997.40, 2001.40];

    let outcome = engine().evaluate(&input).unwrap();
    assert_eq!(
        rejection_reasons(&outcome),
        vec![RejectionReason::RiskRewardBelowMinimum]
    );
}

#[test]
fn test_bearish_structure_produces_short_signal() {
    let mut input = quiet_cycle();
    snapshot_mut(&mut input, Timeframe::D1).trend_direction = TrendDirection::Down;
    {
        let h4 = snapshot_mut(&mut input, Timeframe::H4);
        h4.trend_direction = TrendDirection::Down;
        h4.market_structure_break = Some(Direction::Bearish);
    }
    snapshot_mut(&mut input, Timeframe::H1).order_blocks.push(PriceZone {
        low: 2000.60,
        high: 2001.90,
        bias: Direction::Bearish,
        tested: false,
    });
    {
        let m15 = snapshot_mut(&mut input, Timeframe::M15);
        m15.liquidity_sweep = Some(Direction::Bearish);
        m15.momentum.macd_histogram = -0.3;
        m15.support_resistance_levels = vec![2003.40];
    }

    let outcome = engine().evaluate(&input).unwrap();
    let signal = outcome.signal().expect("expected a signal");

    assert_eq!(signal.direction, Direction::Bearish);
    assert!((signal.stop_price - 2003.40).abs() < 1e-9);
    assert!(signal.target_prices.iter().all(|&t| t < ENTRY));
    assert!(signal.target_prices.windows(2).all(|w| w[1] < w[0]));
    assert_eq!(signal.confidence_score, 1.0);
    // 6 agreeing, full confidence, structural evidence
    assert_eq!(signal.quality, SignalQuality::Excellent);
}

#[test]
fn test_identical_input_gives_identical_output() {
    let engine = engine();
    let input = aligned_bullish_cycle();

    let first = serde_json::to_string(&engine.evaluate(&input).unwrap()).unwrap();
    let second = serde_json::to_string(&engine.evaluate(&input).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_cycle_json_fixture_evaluates() {
    let snapshot = |tf: &str, trend: &str, rsi: f64| {
        serde_json::json!({
            "timeframe": tf,
            "current_price": 2000.0,
            "trend_direction": trend,
            "momentum": { "rsi": rsi, "macd_histogram": 0.0 },
            "volatility_bands": { "upper": 2010.0, "middle": 2000.0, "lower": 1990.0 }
        })
    };
    let json = serde_json::json!({
        "snapshots": [
            snapshot("1d", "up", 50.0),
            snapshot("4h", "up", 50.0),
            snapshot("1h", "range", 58.0),
            snapshot("15m", "range", 50.0),
        ],
        "risk": {
            "account_balance": 10000.0,
            "risk_percentage": 2.0,
            "trades_today": 0,
            "daily_pnl_percent": 0.0,
            "max_daily_trades": 5,
            "max_daily_loss_percent": 5.0
        }
    });

    let input: CycleInput = serde_json::from_value(json).unwrap();
    let outcome = engine().evaluate(&input).unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["outcome"], "signal");
    assert_eq!(value["direction"], "bullish");
    assert_eq!(value["confirmations_used"][0]["timeframe"], "1d");
}

#[test]
fn test_non_finite_indicator_is_an_engine_error() {
    let mut input = aligned_bullish_cycle();
    snapshot_mut(&mut input, Timeframe::H4).momentum.rsi = f64::NAN;

    let result = engine().evaluate(&input);
    assert!(matches!(
        result,
        Err(EngineError::NonFiniteValue {
            timeframe: Timeframe::H4,
            ..
        })
    ));
}
