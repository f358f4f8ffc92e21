use goldsignal::config::EngineConfig;
use goldsignal::models::{
    CycleInput, Direction, MomentumState, PriceZone, Timeframe, TimeframeSnapshot, TrendDirection,
};
use goldsignal::risk::RiskContext;
use goldsignal::signal::Outcome;
use goldsignal::{Result, SignalEngine};

const PRICE: f64 = 2350.0;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("goldsignal=warn")
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          GOLDSIGNAL SCENARIO WALKTHROUGH              ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let engine = SignalEngine::new(EngineConfig::load(None)?)?;

    let scenarios: Vec<(&str, CycleInput)> = vec![
        ("📈 Aligned uptrend", aligned_uptrend()),
        ("🔢 Two confirmations", two_confirmations()),
        ("🛑 Trade cap reached", trade_cap_reached()),
        ("💸 Daily loss cap", daily_loss_cap()),
        ("↔️  Timeframes disagree", timeframes_disagree()),
        ("📏 Tight support (80 pips)", tight_support()),
        ("🧱 Resistance in the way", resistance_in_the_way()),
        ("📉 Bearish breakdown", bearish_breakdown()),
    ];

    println!(
        "\n{:<28} {:>8} {:>9} {:>9} {:>6} {:>6} {:>6}  {}",
        "Scenario", "Side", "Entry", "Stop", "Pips", "Lots", "R:R", "Result"
    );
    println!("{}", "─".repeat(100));

    for (name, input) in scenarios {
        match engine.evaluate(&input) {
            Ok(Outcome::Signal(s)) => println!(
                "{:<28} {:>8} {:>9.2} {:>9.2} {:>6.0} {:>6.2} {:>6.2}  {:?} ({:.0}%)",
                name,
                format!("{:?}", s.direction),
                s.entry_price,
                s.stop_price,
                s.stop_distance_pips,
                s.position_size_lots,
                s.risk_reward_ratio,
                s.quality,
                s.confidence_score * 100.0
            ),
            Ok(Outcome::Rejection(r)) => {
                println!(
                    "{:<28} {:>8} {:>9} {:>9} {:>6} {:>6} {:>6}  {}",
                    name, "-", "-", "-", "-", "-", "-", r
                )
            }
            Err(e) => eprintln!("❌ {} failed: {}", name, e),
        }
    }

    println!();
    Ok(())
}

fn base() -> CycleInput {
    CycleInput {
        snapshots: Timeframe::ALL
            .iter()
            .map(|&tf| TimeframeSnapshot::neutral(tf, PRICE))
            .collect(),
        risk: RiskContext::new(10000.0, 2.0),
        news: None,
    }
}

fn with<F: Fn(&mut TimeframeSnapshot)>(mut input: CycleInput, tf: Timeframe, f: F) -> CycleInput {
    if let Some(s) = input.snapshots.iter_mut().find(|s| s.timeframe == tf) {
        f(s);
    }
    input
}

fn aligned_uptrend() -> CycleInput {
    let input = with(base(), Timeframe::D1, |s| s.trend_direction = TrendDirection::Up);
    let input = with(input, Timeframe::H4, |s| s.trend_direction = TrendDirection::Up);
    with(input, Timeframe::H1, |s| {
        s.momentum = MomentumState {
            rsi: 61.0,
            macd_histogram: 0.8,
        }
    })
}

fn two_confirmations() -> CycleInput {
    let input = with(base(), Timeframe::D1, |s| s.trend_direction = TrendDirection::Up);
    with(input, Timeframe::H4, |s| s.trend_direction = TrendDirection::Up)
}

fn trade_cap_reached() -> CycleInput {
    let mut input = aligned_uptrend();
    input.risk.trades_today = input.risk.max_daily_trades;
    input
}

fn daily_loss_cap() -> CycleInput {
    let mut input = aligned_uptrend();
    input.risk.daily_pnl_percent = -5.2;
    input
}

fn timeframes_disagree() -> CycleInput {
    let input = with(base(), Timeframe::D1, |s| s.trend_direction = TrendDirection::Up);
    let input = with(input, Timeframe::H4, |s| s.trend_direction = TrendDirection::Down);
    let input = with(input, Timeframe::H1, |s| s.trend_direction = TrendDirection::Down);
    with(input, Timeframe::M15, |s| s.momentum.rsi = 38.0)
}

fn tight_support() -> CycleInput {
    with(aligned_uptrend(), Timeframe::H1, |s| {
        s.support_resistance_levels = vec![PRICE - 0.80]
    })
}

fn resistance_in_the_way() -> CycleInput {
    with(aligned_uptrend(), Timeframe::H4, |s| {
        s.support_resistance_levels = vec![PRICE - 2.60, PRICE + 1.40]
    })
}

fn bearish_breakdown() -> CycleInput {
    let input = with(base(), Timeframe::D1, |s| s.trend_direction = TrendDirection::Down);
    let input = with(input, Timeframe::H4, |s| {
        s.trend_direction = TrendDirection::Down;
        s.market_structure_break = Some(Direction::Bearish);
    });
    let input = with(input, Timeframe::H1, |s| {
        s.order_blocks.push(PriceZone {
            low: PRICE + 0.60,
            high: PRICE + 1.90,
            bias: Direction::Bearish,
            tested: false,
        })
    });
    with(input, Timeframe::M15, |s| {
        s.liquidity_sweep = Some(Direction::Bearish);
        s.momentum.macd_histogram = -0.3;
    })
}
