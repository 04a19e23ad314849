//! Parley simulation binary.
//!
//! Runs the seeded two-party conversation scenario one or more times and
//! fails if any run violates a synchronization invariant.
//!
//! # Usage
//!
//! ```bash
//! # One run with seed 42
//! parley-sim --seed 42
//!
//! # 100 consecutive seeds, correlated merging
//! parley-sim --seed 0 --runs 100 --correlated
//! ```

use std::time::Duration;

use clap::Parser;
use parley_core::MergePolicy;
use parley_harness::{ScenarioConfig, run_conversation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley deterministic simulation
#[derive(Parser, Debug)]
#[command(name = "parley-sim")]
#[command(about = "Seeded end-to-end simulation of Parley chat sessions")]
#[command(version)]
struct Args {
    /// First seed
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(short, long, default_value = "1")]
    runs: u64,

    /// Messages sent per run
    #[arg(short, long, default_value = "16")]
    messages: usize,

    /// Reconcile echoes by client id instead of (text, sender)
    #[arg(long)]
    correlated: bool,

    /// Convergence timeout per wait, in milliseconds
    #[arg(long, default_value = "5000")]
    settle_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let merge_policy =
        if args.correlated { MergePolicy::Correlated } else { MergePolicy::TextAndSender };

    let mut failed = Vec::new();
    for seed in args.seed..args.seed.saturating_add(args.runs) {
        let config = ScenarioConfig {
            seed,
            messages: args.messages,
            merge_policy,
            settle_timeout: Duration::from_millis(args.settle_timeout_ms),
        };

        let report = run_conversation(&config).await?;
        for violation in &report.violations {
            tracing::error!(seed, %violation, "invariant violated");
        }
        if !report.is_ok() {
            failed.push(seed);
        }
    }

    if failed.is_empty() {
        tracing::info!(runs = args.runs, "all runs passed");
        Ok(())
    } else {
        Err(format!("invariant violations in seeds {failed:?}").into())
    }
}
