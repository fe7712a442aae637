//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Second-order boosting driven by any [`Objective`], with early stopping on
//! a held-out split scored by any [`EvalMetric`].

use pir_loss_core::{EvalMetric, Objective};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;
use crate::model::{Model, ModelMetadata};

/// GBDT training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub num_rounds: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    pub seed: u64,
    /// Stop after this many rounds without validation improvement
    pub early_stopping_rounds: Option<usize>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            num_rounds: 200,
            max_depth: 6,
            min_samples_leaf: 5,
            learning_rate: 0.1,
            lambda: 1.0,
            subsample: 1.0,
            seed: 42,
            early_stopping_rounds: Some(20),
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.num_rounds == 0 {
            return Err(TrainerError::Config("num_rounds must be > 0".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TrainerError::Config(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.lambda >= 0.0 && self.lambda.is_finite()) {
            return Err(TrainerError::Config(format!(
                "lambda must be >= 0, got {}",
                self.lambda
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(TrainerError::Config(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if self.early_stopping_rounds == Some(0) {
            return Err(TrainerError::Config(
                "early_stopping_rounds must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            lambda: self.lambda,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    params: TrainingParams,
}

impl GbdtTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Fit a model on `train`. When `validation` is given, `metric` is
    /// evaluated on it after every round and the ensemble is truncated to
    /// the best round.
    pub fn train(
        &self,
        train: &Dataset,
        validation: Option<&Dataset>,
        objective: &dyn Objective,
        metric: &dyn EvalMetric,
    ) -> Result<Model, TrainerError> {
        self.params.validate()?;

        if train.is_empty() {
            return Err(TrainerError::Training("training set is empty".into()));
        }
        if let Some(valid) = validation {
            if valid.feature_count != train.feature_count {
                return Err(TrainerError::Training(format!(
                    "validation has {} features, training has {}",
                    valid.feature_count, train.feature_count
                )));
            }
        }

        let base_score = train.target_mean();
        let learning_rate = self.params.learning_rate;
        let tree_config = self.params.tree_config();

        let mut predictions = vec![base_score; train.len()];
        let mut valid_predictions = validation.map(|v| vec![base_score; v.len()]);

        let mut rng = LcgRng::new(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.num_rounds);
        let mut eval_history = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for round in 0..self.params.num_rounds {
            let gradients = objective.gradients(&train.targets, &predictions)?;
            let rows = rng.sample_rows(train.len(), self.params.subsample);

            let tree = CartBuilder::new(&train.features, &gradients, tree_config.clone()).build(&rows);

            for (pred, row) in predictions.iter_mut().zip(&train.features) {
                *pred += learning_rate * tree.evaluate(row);
            }

            if let (Some(valid), Some(valid_preds)) = (validation, valid_predictions.as_mut()) {
                for (pred, row) in valid_preds.iter_mut().zip(&valid.features) {
                    *pred += learning_rate * tree.evaluate(row);
                }
            }
            trees.push(tree);

            let (Some(valid), Some(valid_preds)) = (validation, valid_predictions.as_ref()) else {
                continue;
            };

            let eval = metric.evaluate(&valid.targets, valid_preds)?;
            debug!(round, metric = %eval.name, value = eval.value, "boosting round");
            eval_history.push(eval.value);

            match best {
                Some((_, best_value)) if !eval.improves_on(best_value) => {}
                _ => best = Some((round, eval.value)),
            }

            if let (Some(patience), Some((best_round, _))) = (self.params.early_stopping_rounds, best) {
                if round - best_round >= patience {
                    info!(
                        round,
                        best_round,
                        metric = %eval.name,
                        "early stopping: no improvement in {} rounds",
                        patience
                    );
                    break;
                }
            }
        }

        if let Some((best_round, _)) = best {
            trees.truncate(best_round + 1);
        }

        let metadata = ModelMetadata {
            objective: objective.name(),
            eval_metric: validation.map(|_| metric.name()),
            feature_count: train.feature_count,
            best_iteration: best.map(|(round, _)| round),
            best_score: best.map(|(_, value)| value),
            eval_history,
            trained_at: chrono::Utc::now().timestamp(),
        };

        Ok(Model {
            base_score,
            learning_rate,
            trees,
            metadata,
        })
    }
}
