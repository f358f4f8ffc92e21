use std::path::PathBuf;

use clap::{Parser, Subcommand};
use goldsignal::config::EngineConfig;
use goldsignal::feed::{self, DEFAULT_POLL_INTERVAL_SECS};
use goldsignal::signal::Outcome;
use goldsignal::{setup_logging, Result, SignalEngine};
use tokio::time::Duration;

#[derive(Parser)]
#[command(
    name = "goldsignal",
    about = "XAU/USD confirmation and signal engine"
)]
struct Cli {
    /// TOML config file. GOLDSIGNAL_* environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print outcomes as JSON instead of a summary line.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single cycle file once.
    Evaluate {
        /// JSON file holding four timeframe snapshots and the risk context.
        cycle: PathBuf,
    },
    /// Re-evaluate a cycle file on a fixed interval.
    Watch {
        /// JSON cycle file, rewritten by the upstream data collector.
        cycle: PathBuf,

        /// Seconds between cycles.
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
        interval_secs: u64,

        /// Stop after this many cycles (runs forever if omitted).
        #[arg(long)]
        max_ticks: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;
    let engine = SignalEngine::new(config)?;

    match cli.command {
        Commands::Evaluate { cycle } => {
            let outcome = feed::evaluate_file(&engine, &cycle)?;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Watch {
            cycle,
            interval_secs,
            max_ticks,
        } => {
            tracing::info!(
                "🚀 Watching {} every {}s",
                cycle.display(),
                interval_secs
            );
            let json = cli.json;
            let evaluated = feed::watch(
                &engine,
                cycle,
                Duration::from_secs(interval_secs),
                max_ticks,
                |outcome| {
                    if let Err(e) = print_outcome(outcome, json) {
                        tracing::error!("Failed to print outcome: {}", e);
                    }
                },
            )
            .await;
            tracing::info!("Stopped after {} evaluated cycles", evaluated);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    println!("{}", outcome);
    if let Outcome::Signal(signal) = outcome {
        for confirmation in &signal.confirmations_used {
            println!("   • {} [{:?}]", confirmation, confirmation.importance());
        }
    }
    Ok(())
}
