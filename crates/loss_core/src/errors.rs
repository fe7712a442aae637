//! Error types for the loss library and outcome scorer

use thiserror::Error;

use crate::loss::PenaltyShape;

/// Errors raised by loss evaluation and outcome scoring
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LossError {
    /// Truth and prediction sequences are not index-aligned
    #[error("length mismatch: {truths} truths vs {predictions} predictions")]
    LengthMismatch { truths: usize, predictions: usize },

    /// Penalty coefficient is not a positive finite number
    #[error("invalid penalty coefficient: {0} (must be finite and > 0)")]
    InvalidPenalty(f64),

    /// A truth value is zero or negative, so normalized winnings are undefined
    #[error("truth at index {index} must be > 0 to normalize winnings, got {value}")]
    NonPositiveTruth { index: usize, value: f64 },

    /// A prediction is NaN or infinite and cannot be scored
    #[error("prediction at index {index} is not finite: {value}")]
    NonFinitePrediction { index: usize, value: f64 },

    /// Mean loss requested over an empty sequence
    #[error("cannot evaluate a loss over an empty sequence")]
    Empty,

    /// Shape has no usable second derivative for boosting
    #[error("penalty shape `{0}` has no curvature and cannot drive training")]
    NoCurvature(PenaltyShape),
}

/// Result type for loss library operations
pub type Result<T> = std::result::Result<T, LossError>;
