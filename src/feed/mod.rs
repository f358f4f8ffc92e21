// Cycle files and the polling loop used by the CLI
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::models::CycleInput;
use crate::signal::{Outcome, SignalEngine};

/// Seconds between cycles, one 5-minute candle
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Read a JSON-encoded `CycleInput`
pub fn load_cycle(path: &Path) -> anyhow::Result<CycleInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cycle file {}", path.display()))?;
    let input: CycleInput = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse cycle file {}", path.display()))?;
    Ok(input)
}

/// Evaluate one cycle file. Malformed input surfaces as an error.
pub fn evaluate_file(engine: &SignalEngine, path: &Path) -> anyhow::Result<Outcome> {
    let input = load_cycle(path)?;
    let outcome = engine
        .evaluate(&input)
        .with_context(|| format!("Invalid cycle input in {}", path.display()))?;
    Ok(outcome)
}

/// Re-read `path` every `period` and evaluate it, handing each outcome to
/// `on_outcome`. Runs `max_ticks` cycles, or forever when `None`.
///
/// A file that fails to load or validate is logged and skipped; the upstream
/// writer may be mid-update and the next tick gets a fresh copy.
pub async fn watch<F>(
    engine: &SignalEngine,
    path: PathBuf,
    period: Duration,
    max_ticks: Option<usize>,
    mut on_outcome: F,
) -> usize
where
    F: FnMut(&Outcome),
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut evaluated = 0;
    let mut ticks = 0;
    loop {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        ticker.tick().await;
        ticks += 1;

        match evaluate_file(engine, &path) {
            Ok(outcome) => {
                evaluated += 1;
                on_outcome(&outcome);
            }
            Err(e) => tracing::warn!("⚠️  Skipping cycle {}: {:#}", ticks, e),
        }
    }

    evaluated
}
