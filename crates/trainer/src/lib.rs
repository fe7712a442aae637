//! Price regression trainer and loss-function experiment runner
//!
//! Fits second-order gradient boosted trees under the asymmetric objectives
//! from `pir-loss-core` and scores each model's test predictions for
//! "price is right" winnings.

pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod experiment;
pub mod model;
pub mod trainer;

use std::path::Path;

pub use config::ExperimentConfig;
pub use dataset::Dataset;
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use experiment::{
    ExperimentOutcome, ExperimentRunner, ExperimentSpec, MetricKind, ObjectiveKind, Splits,
};
pub use model::{Model, ModelMetadata, Node, Tree};
pub use trainer::{GbdtTrainer, TrainingParams};

/// Load the train and test CSVs and build the three splits.
pub fn load_splits(
    train_path: &Path,
    test_path: &Path,
    config: &ExperimentConfig,
) -> Result<Splits, TrainerError> {
    let train =
        Dataset::from_csv(train_path).map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;
    let mut test =
        Dataset::from_csv(test_path).map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;

    if let Some(seed) = config.shuffle_seed {
        test.shuffle(seed);
    }

    Splits::from_datasets(train, test, config.validation_fraction)
}

/// Run the full penalty sweep straight from CSV files.
pub fn run_experiments_from_csv(
    train_path: &Path,
    test_path: &Path,
    config: &ExperimentConfig,
) -> Result<Vec<ExperimentOutcome>, TrainerError> {
    let runner = ExperimentRunner::from_config(config)?;
    let splits = load_splits(train_path, test_path, config)?;
    runner.run_sweep(&splits)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
