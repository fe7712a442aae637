//! Index-aligned truth/prediction sequences

use serde::{Deserialize, Serialize};

use crate::errors::{LossError, Result};

/// Fail fast when truths and predictions are not the same length.
pub fn ensure_aligned(truths: &[f64], predictions: &[f64]) -> Result<()> {
    if truths.len() != predictions.len() {
        return Err(LossError::LengthMismatch {
            truths: truths.len(),
            predictions: predictions.len(),
        });
    }
    Ok(())
}

/// Ordered (truth, prediction) pairs produced once per experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPairs {
    truths: Vec<f64>,
    predictions: Vec<f64>,
}

impl PredictionPairs {
    pub fn new(truths: Vec<f64>, predictions: Vec<f64>) -> Result<Self> {
        ensure_aligned(&truths, &predictions)?;
        Ok(Self {
            truths,
            predictions,
        })
    }

    pub fn truths(&self) -> &[f64] {
        &self.truths
    }

    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.truths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truths.is_empty()
    }

    /// Iterate `(truth, prediction)` in order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.truths
            .iter()
            .copied()
            .zip(self.predictions.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let err = PredictionPairs::new(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            LossError::LengthMismatch {
                truths: 2,
                predictions: 1
            }
        );
    }

    #[test]
    fn iterates_in_order() {
        let pairs = PredictionPairs::new(vec![10.0, 20.0], vec![9.0, 21.0]).unwrap();
        let collected: Vec<_> = pairs.iter().collect();
        assert_eq!(collected, vec![(10.0, 9.0), (20.0, 21.0)]);
        assert_eq!(pairs.len(), 2);
    }
}
