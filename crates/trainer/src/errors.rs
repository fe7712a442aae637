use pir_loss_core::LossError;
use thiserror::Error;

/// Errors returned by the trainer and experiment runner.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Loss(#[from] LossError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
