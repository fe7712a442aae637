//! Loss-function experiment CLI
//!
//! Trains one model per (penalty, objective, metric) combination and prints
//! the winnings report for each.

use anyhow::{Context, Result};
use clap::Parser;
use pir_trainer::{load_splits, ExperimentConfig, ExperimentRunner};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pir-experiments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare asymmetric boosting losses on a price-guessing task", long_about = None)]
struct Args {
    /// Training CSV (numeric columns, last column is the price)
    #[arg(long)]
    train: PathBuf,

    /// Test CSV; its leading rows become the early-stopping split
    #[arg(long)]
    test: PathBuf,

    /// TOML experiment configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Over-prediction penalty (repeatable); replaces the configured sweep
    #[arg(short, long = "penalty")]
    penalties: Vec<f64>,

    /// Maximum boosting rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Share of the test CSV used for early stopping
    #[arg(long)]
    validation_fraction: Option<f64>,

    /// Emit one JSON object per experiment instead of text reports
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Price-is-right loss experiments v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    if !args.penalties.is_empty() {
        config.penalties = args.penalties.clone();
    }
    if let Some(rounds) = args.rounds {
        config.training.num_rounds = rounds;
    }
    if let Some(fraction) = args.validation_fraction {
        config.validation_fraction = fraction;
    }

    let runner = ExperimentRunner::from_config(&config).context("Invalid configuration")?;

    info!("Loading train={} test={}", args.train.display(), args.test.display());
    let splits = load_splits(&args.train, &args.test, &config).context("Failed to load datasets")?;

    info!(
        "Splits: train={} validation={} test={} ({} features)",
        splits.train.len(),
        splits.validation.len(),
        splits.test.len(),
        splits.train.feature_count
    );
    for (i, (min, max)) in splits.train.feature_stats().iter().enumerate() {
        info!("  Feature {}: min={}, max={}", i, min, max);
    }
    info!(
        "Penalties: {:?}, {} experiments each",
        config.penalties,
        runner.suite().len()
    );

    let outcomes = runner.run_sweep(&splits)?;

    for outcome in &outcomes {
        if args.json {
            println!(
                "{}",
                serde_json::to_string(outcome).context("Failed to encode outcome")?
            );
        } else {
            println!("{outcome}\n");
        }
    }

    info!("✓ {} experiments completed", outcomes.len());

    Ok(())
}
