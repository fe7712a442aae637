//! Asymmetric objective and evaluation functions
//!
//! Every loss here is built from `err = truth - prediction`. A negative
//! error means the prediction overshot the truth, and that branch is scaled
//! by the [`Penalty`] coefficient so that boosting is biased towards
//! under-prediction. `err == 0` falls on the not-over branch.
//!
//! Two contracts are exposed to the trainer:
//!
//! - [`Objective`]: per-pair gradient and curvature, consumed once per
//!   boosting round by a second-order optimizer.
//! - [`EvalMetric`]: mean per-pair loss over a held-out split, consumed once
//!   per round to drive early stopping. Lower is always better.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LossError, Result};
use crate::pairs::ensure_aligned;
use crate::penalty::Penalty;

/// Shape of the per-pair penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyShape {
    /// `err²`, scaled by the penalty when over-predicted
    Squared,
    /// `|err|`, scaled by the penalty when over-predicted
    Absolute,
    /// `-prediction` when over-predicted, zero otherwise
    Winnings,
}

impl PenaltyShape {
    pub fn as_str(self) -> &'static str {
        match self {
            PenaltyShape::Squared => "squared",
            PenaltyShape::Absolute => "absolute",
            PenaltyShape::Winnings => "winnings",
        }
    }

    /// Metric name reported during evaluation
    pub fn metric_name(self) -> &'static str {
        match self {
            PenaltyShape::Squared => "asym_squared",
            PenaltyShape::Absolute => "asym_absolute",
            PenaltyShape::Winnings => "winnings_approx",
        }
    }
}

impl fmt::Display for PenaltyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First and second derivative of a per-pair loss w.r.t. the prediction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GradientPair {
    pub grad: f64,
    pub hess: f64,
}

impl GradientPair {
    pub fn new(grad: f64, hess: f64) -> Self {
        Self { grad, hess }
    }
}

/// A penalty shape bound to its coefficient.
///
/// The coefficient travels with the value, so two experiments holding
/// different losses never observe each other's penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymmetricLoss {
    pub shape: PenaltyShape,
    pub penalty: Penalty,
}

impl AsymmetricLoss {
    pub fn new(shape: PenaltyShape, penalty: Penalty) -> Self {
        Self { shape, penalty }
    }

    pub fn squared(penalty: Penalty) -> Self {
        Self::new(PenaltyShape::Squared, penalty)
    }

    pub fn absolute(penalty: Penalty) -> Self {
        Self::new(PenaltyShape::Absolute, penalty)
    }

    /// The winnings approximation ignores the coefficient; it is kept only
    /// so every shape shares one representation.
    pub fn winnings() -> Self {
        Self::new(PenaltyShape::Winnings, Penalty::SYMMETRIC)
    }

    /// Multiplier for the branch `err` falls on.
    #[inline]
    fn branch_weight(&self, err: f64) -> f64 {
        if err < 0.0 {
            self.penalty.value()
        } else {
            1.0
        }
    }

    /// Per-pair loss value
    pub fn pair_loss(&self, truth: f64, prediction: f64) -> f64 {
        let err = truth - prediction;
        match self.shape {
            PenaltyShape::Squared => err * err * self.branch_weight(err),
            PenaltyShape::Absolute => err.abs() * self.branch_weight(err),
            PenaltyShape::Winnings => {
                if err < 0.0 {
                    -prediction
                } else {
                    0.0
                }
            }
        }
    }

    /// Gradient and curvature for boosting. Only the squared shape has a
    /// non-degenerate second derivative.
    pub fn gradient_pair(&self, truth: f64, prediction: f64) -> Result<GradientPair> {
        match self.shape {
            PenaltyShape::Squared => Ok(self.squared_gradient(truth, prediction)),
            other => Err(LossError::NoCurvature(other)),
        }
    }

    #[inline]
    fn squared_gradient(&self, truth: f64, prediction: f64) -> GradientPair {
        let err = truth - prediction;
        let weight = self.branch_weight(err);
        GradientPair::new(-2.0 * weight * err, 2.0 * weight)
    }
}

/// Training objective: supplies gradient and curvature per pair.
pub trait Objective: Send + Sync {
    fn name(&self) -> String;

    fn gradient_pair(&self, truth: f64, prediction: f64) -> GradientPair;

    /// Gradients for a whole split. Fails on length mismatch.
    fn gradients(&self, truths: &[f64], predictions: &[f64]) -> Result<Vec<GradientPair>> {
        ensure_aligned(truths, predictions)?;
        Ok(truths
            .iter()
            .zip(predictions)
            .map(|(&truth, &prediction)| self.gradient_pair(truth, prediction))
            .collect())
    }
}

/// Squared-error objective, optionally penalising over-predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquaredObjective {
    loss: AsymmetricLoss,
}

impl SquaredObjective {
    /// Plain squared error (`grad = -2·err`, `hess = 2`)
    pub fn standard() -> Self {
        Self::asymmetric(Penalty::SYMMETRIC)
    }

    pub fn asymmetric(penalty: Penalty) -> Self {
        Self {
            loss: AsymmetricLoss::squared(penalty),
        }
    }

    pub fn penalty(&self) -> Penalty {
        self.loss.penalty
    }
}

impl Default for SquaredObjective {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<AsymmetricLoss> for SquaredObjective {
    type Error = LossError;

    fn try_from(loss: AsymmetricLoss) -> Result<Self> {
        match loss.shape {
            PenaltyShape::Squared => Ok(Self { loss }),
            other => Err(LossError::NoCurvature(other)),
        }
    }
}

impl Objective for SquaredObjective {
    fn name(&self) -> String {
        if self.loss.penalty.is_symmetric() {
            "squared_error".to_string()
        } else {
            "asym_squared".to_string()
        }
    }

    fn gradient_pair(&self, truth: f64, prediction: f64) -> GradientPair {
        self.loss.squared_gradient(truth, prediction)
    }
}

/// Result of an evaluation pass: `(name, value, higher_is_better)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub name: String,
    pub value: f64,
    pub higher_is_better: bool,
}

impl Evaluation {
    /// Whether this evaluation is strictly better than `best`.
    pub fn improves_on(&self, best: f64) -> bool {
        if self.higher_is_better {
            self.value > best
        } else {
            self.value < best
        }
    }
}

/// Evaluation metric: mean per-pair loss used for early stopping.
pub trait EvalMetric: Send + Sync {
    fn name(&self) -> String;

    fn pair_loss(&self, truth: f64, prediction: f64) -> f64;

    fn higher_is_better(&self) -> bool {
        false
    }

    /// Arithmetic mean of the per-pair loss over the split.
    fn evaluate(&self, truths: &[f64], predictions: &[f64]) -> Result<Evaluation> {
        ensure_aligned(truths, predictions)?;
        if truths.is_empty() {
            return Err(LossError::Empty);
        }

        let total: f64 = truths
            .iter()
            .zip(predictions)
            .map(|(&truth, &prediction)| self.pair_loss(truth, prediction))
            .sum();

        Ok(Evaluation {
            name: self.name(),
            value: total / truths.len() as f64,
            higher_is_better: self.higher_is_better(),
        })
    }
}

impl EvalMetric for AsymmetricLoss {
    fn name(&self) -> String {
        self.shape.metric_name().to_string()
    }

    fn pair_loss(&self, truth: f64, prediction: f64) -> f64 {
        AsymmetricLoss::pair_loss(self, truth, prediction)
    }
}

/// Evaluation metrics available to experiments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Mean absolute error
    Mae,
    /// Mean squared error
    Mse,
    Asymmetric(AsymmetricLoss),
}

impl Metric {
    fn as_loss(&self) -> AsymmetricLoss {
        match self {
            Metric::Mae => AsymmetricLoss::absolute(Penalty::SYMMETRIC),
            Metric::Mse => AsymmetricLoss::squared(Penalty::SYMMETRIC),
            Metric::Asymmetric(loss) => *loss,
        }
    }
}

impl EvalMetric for Metric {
    fn name(&self) -> String {
        match self {
            Metric::Mae => "mae".to_string(),
            Metric::Mse => "mse".to_string(),
            Metric::Asymmetric(loss) => EvalMetric::name(loss),
        }
    }

    fn pair_loss(&self, truth: f64, prediction: f64) -> f64 {
        self.as_loss().pair_loss(truth, prediction)
    }
}
