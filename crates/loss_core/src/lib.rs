//! Asymmetric loss library and winnings scorer for price regression
//!
//! Modules:
//! - `loss`: Asymmetric objective (gradient/curvature) and evaluation metrics
//! - `penalty`: Validated over-prediction penalty coefficient
//! - `pairs`: Index-aligned truth/prediction sequences
//! - `scorer`: "Price is right" winnings scorer and its report
//! - `errors`: Error type shared by the above

pub mod errors;
pub mod loss;
pub mod pairs;
pub mod penalty;
pub mod scorer;

pub use errors::{LossError, Result};
pub use loss::{
    AsymmetricLoss, EvalMetric, Evaluation, GradientPair, Metric, Objective, PenaltyShape,
    SquaredObjective,
};
pub use pairs::{ensure_aligned, PredictionPairs};
pub use penalty::Penalty;
pub use scorer::{score_pairs, OutcomeReport, OutcomeScorer};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
