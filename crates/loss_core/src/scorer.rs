//! Winnings scorer
//!
//! A guess that overshoots the price wins nothing. Any other guess wins its
//! own value, and the normalized score divides that by the price so that
//! cheap and expensive items weigh the same.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LossError, Result};
use crate::pairs::{ensure_aligned, PredictionPairs};

/// Aggregate outcome of one set of predictions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OutcomeReport {
    /// Sum of predictions that did not exceed their truth
    pub winnings: f64,
    /// Sum of `prediction / truth` for those same predictions
    pub normalized_winnings: f64,
    /// Number of predictions strictly above their truth
    pub over_predictions: usize,
    /// Number of scored pairs
    pub total: usize,
}

impl OutcomeReport {
    pub fn over_prediction_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.over_predictions as f64 / self.total as f64
        }
    }

    /// Three-line human readable summary
    pub fn report(&self) -> String {
        self.to_string()
    }

    fn record(&mut self, truth: f64, prediction: f64) {
        self.total += 1;
        if prediction > truth {
            self.over_predictions += 1;
        } else {
            self.winnings += prediction;
            self.normalized_winnings += prediction / truth;
        }
    }
}

impl fmt::Display for OutcomeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Over-predictions: {}/{}", self.over_predictions, self.total)?;
        writeln!(f, "Normalized winnings: {:.4}", self.normalized_winnings)?;
        write!(f, "Total winnings: {:.2}", self.winnings)
    }
}

/// Scores predictions against truths held for one experiment.
#[derive(Debug, Clone)]
pub struct OutcomeScorer {
    truths: Vec<f64>,
    predictions: Vec<f64>,
}

impl OutcomeScorer {
    /// Every truth must be strictly positive; a zero price would make the
    /// normalized term undefined. Predictions must be finite.
    pub fn new(truths: Vec<f64>, predictions: Vec<f64>) -> Result<Self> {
        ensure_aligned(&truths, &predictions)?;
        validate_truths(&truths)?;
        validate_predictions(&predictions)?;
        Ok(Self {
            truths,
            predictions,
        })
    }

    pub fn from_pairs(pairs: &PredictionPairs) -> Result<Self> {
        Self::new(pairs.truths().to_vec(), pairs.predictions().to_vec())
    }

    pub fn score(&self) -> OutcomeReport {
        let mut report = OutcomeReport::default();
        for (&truth, &prediction) in self.truths.iter().zip(&self.predictions) {
            report.record(truth, prediction);
        }
        tracing::debug!(
            total = report.total,
            over = report.over_predictions,
            winnings = report.winnings,
            "scored predictions"
        );
        report
    }

    pub fn report(&self) -> String {
        self.score().report()
    }
}

/// Score a pair set without keeping a scorer around.
pub fn score_pairs(pairs: &PredictionPairs) -> Result<OutcomeReport> {
    OutcomeScorer::from_pairs(pairs).map(|scorer| scorer.score())
}

fn validate_truths(truths: &[f64]) -> Result<()> {
    match truths
        .iter()
        .enumerate()
        .find(|&(_, &value)| !(value > 0.0))
    {
        Some((index, &value)) => Err(LossError::NonPositiveTruth { index, value }),
        None => Ok(()),
    }
}

fn validate_predictions(predictions: &[f64]) -> Result<()> {
    match predictions.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(LossError::NonFinitePrediction {
            index,
            value: predictions[index],
        }),
        None => Ok(()),
    }
}
