//! Loss-function experiments
//!
//! One experiment fits a model with a chosen objective, early-stops it with
//! a chosen evaluation metric, predicts the test split and scores the
//! predictions for winnings. A batch runs the standard suite for a single
//! penalty; a sweep runs one batch per configured penalty.

use pir_loss_core::{
    score_pairs, AsymmetricLoss, EvalMetric, Metric, OutcomeReport, Penalty, PredictionPairs,
    SquaredObjective,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::dataset::Dataset;
use crate::errors::TrainerError;
use crate::trainer::{GbdtTrainer, TrainingParams};

/// Training objective selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    SquaredError,
    AsymmetricSquared,
}

impl ObjectiveKind {
    /// Label used in outcomes, independent of the penalty value
    pub fn name(self) -> &'static str {
        match self {
            ObjectiveKind::SquaredError => "squared_error",
            ObjectiveKind::AsymmetricSquared => "asym_squared",
        }
    }

    pub fn resolve(self, penalty: Penalty) -> SquaredObjective {
        match self {
            ObjectiveKind::SquaredError => SquaredObjective::standard(),
            ObjectiveKind::AsymmetricSquared => SquaredObjective::asymmetric(penalty),
        }
    }
}

/// Evaluation metric selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Mae,
    Mse,
    AsymmetricSquared,
    AsymmetricAbsolute,
    WinningsApprox,
}

impl MetricKind {
    pub fn resolve(self, penalty: Penalty) -> Metric {
        match self {
            MetricKind::Mae => Metric::Mae,
            MetricKind::Mse => Metric::Mse,
            MetricKind::AsymmetricSquared => Metric::Asymmetric(AsymmetricLoss::squared(penalty)),
            MetricKind::AsymmetricAbsolute => {
                Metric::Asymmetric(AsymmetricLoss::absolute(penalty))
            }
            MetricKind::WinningsApprox => Metric::Asymmetric(AsymmetricLoss::winnings()),
        }
    }
}

/// One objective/metric combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub objective: ObjectiveKind,
    pub metric: MetricKind,
}

impl ExperimentSpec {
    pub const fn new(objective: ObjectiveKind, metric: MetricKind) -> Self {
        Self { objective, metric }
    }

    /// The six experiments run for every penalty
    pub fn standard_suite() -> Vec<ExperimentSpec> {
        use ObjectiveKind::{AsymmetricSquared as AsymObjective, SquaredError};

        vec![
            Self::new(SquaredError, MetricKind::Mae),
            Self::new(SquaredError, MetricKind::Mse),
            Self::new(AsymObjective, MetricKind::AsymmetricSquared),
            Self::new(AsymObjective, MetricKind::AsymmetricAbsolute),
            Self::new(AsymObjective, MetricKind::WinningsApprox),
            Self::new(AsymObjective, MetricKind::Mae),
        ]
    }
}

/// Train / validation / test partitions
#[derive(Debug, Clone)]
pub struct Splits {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

impl Splits {
    /// Carve the validation split off the front of `test`.
    pub fn from_datasets(
        train: Dataset,
        test: Dataset,
        validation_fraction: f64,
    ) -> Result<Self, TrainerError> {
        if train.feature_count != test.feature_count {
            return Err(TrainerError::Dataset(format!(
                "train has {} features, test has {}",
                train.feature_count, test.feature_count
            )));
        }

        let (validation, test) = test
            .split(validation_fraction)
            .map_err(|e| TrainerError::Dataset(format!("{e:#}")))?;

        Ok(Self {
            train,
            validation,
            test,
        })
    }
}

/// Result of a single experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub objective: String,
    pub metric: String,
    pub penalty: Penalty,
    /// Trees kept after early stopping
    pub rounds: usize,
    pub best_score: Option<f64>,
    pub fingerprint: String,
    pub report: OutcomeReport,
}

impl fmt::Display for ExperimentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== objective={} eval={} penalty={} rounds={}",
            self.objective, self.metric, self.penalty, self.rounds
        )?;
        write!(f, "{}", self.report)
    }
}

/// Runs experiments with fixed training parameters
pub struct ExperimentRunner {
    trainer: GbdtTrainer,
    penalties: Vec<Penalty>,
    suite: Vec<ExperimentSpec>,
}

impl ExperimentRunner {
    pub fn new(params: TrainingParams, penalties: Vec<Penalty>) -> Self {
        Self {
            trainer: GbdtTrainer::new(params),
            penalties,
            suite: ExperimentSpec::standard_suite(),
        }
    }

    pub fn from_config(config: &ExperimentConfig) -> Result<Self, TrainerError> {
        config.validate()?;
        Ok(Self::new(config.training.clone(), config.penalties()?))
    }

    /// Replace the experiment suite run per penalty
    pub fn with_suite(mut self, suite: Vec<ExperimentSpec>) -> Self {
        self.suite = suite;
        self
    }

    pub fn penalties(&self) -> &[Penalty] {
        &self.penalties
    }

    pub fn suite(&self) -> &[ExperimentSpec] {
        &self.suite
    }

    /// Train, predict the test split and score it
    pub fn run(
        &self,
        splits: &Splits,
        penalty: Penalty,
        spec: ExperimentSpec,
    ) -> Result<ExperimentOutcome, TrainerError> {
        let objective = spec.objective.resolve(penalty);
        let metric = spec.metric.resolve(penalty);

        info!(
            objective = spec.objective.name(),
            metric = %metric.name(),
            %penalty,
            "starting experiment"
        );

        let model = self
            .trainer
            .train(&splits.train, Some(&splits.validation), &objective, &metric)?;

        let pairs = PredictionPairs::new(
            splits.test.targets.clone(),
            model.predict_batch(&splits.test.features),
        )?;
        let report = score_pairs(&pairs)?;

        info!(
            rounds = model.trees.len(),
            over = report.over_predictions,
            winnings = report.winnings,
            normalized = report.normalized_winnings,
            "experiment complete"
        );

        Ok(ExperimentOutcome {
            objective: spec.objective.name().to_string(),
            metric: metric.name(),
            penalty,
            rounds: model.trees.len(),
            best_score: model.metadata.best_score,
            fingerprint: model.fingerprint()?,
            report,
        })
    }

    /// Run the whole suite for one penalty
    pub fn run_batch(
        &self,
        splits: &Splits,
        penalty: Penalty,
    ) -> Result<Vec<ExperimentOutcome>, TrainerError> {
        self.suite
            .iter()
            .map(|&spec| self.run(splits, penalty, spec))
            .collect()
    }

    /// Run one batch per configured penalty
    pub fn run_sweep(&self, splits: &Splits) -> Result<Vec<ExperimentOutcome>, TrainerError> {
        let mut outcomes = Vec::with_capacity(self.penalties.len() * self.suite.len());
        for &penalty in &self.penalties {
            info!(%penalty, experiments = self.suite.len(), "running penalty batch");
            outcomes.extend(self.run_batch(splits, penalty)?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize, offset: f64) -> Dataset {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 + offset]).collect();
        let targets: Vec<f64> = features.iter().map(|r| 20.0 + 3.0 * r[0]).collect();
        Dataset::new(features, targets).unwrap()
    }

    fn quick_params() -> TrainingParams {
        TrainingParams {
            num_rounds: 20,
            max_depth: 2,
            min_samples_leaf: 1,
            learning_rate: 0.3,
            early_stopping_rounds: Some(5),
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_standard_suite_has_six_experiments() {
        let suite = ExperimentSpec::standard_suite();
        assert_eq!(suite.len(), 6);
        assert_eq!(suite[0], ExperimentSpec::new(ObjectiveKind::SquaredError, MetricKind::Mae));
    }

    #[test]
    fn test_kinds_resolve_with_penalty() {
        let p = Penalty::new(5.0).unwrap();
        assert_eq!(ObjectiveKind::AsymmetricSquared.resolve(p).penalty(), p);
        assert_eq!(ObjectiveKind::SquaredError.resolve(p).penalty(), Penalty::SYMMETRIC);
        assert_eq!(MetricKind::AsymmetricAbsolute.resolve(p).name(), "asym_absolute");
        assert_eq!(MetricKind::WinningsApprox.resolve(p).name(), "winnings_approx");
    }

    #[test]
    fn test_splits_from_datasets() {
        let splits = Splits::from_datasets(dataset(20, 0.0), dataset(10, 0.5), 0.5).unwrap();
        assert_eq!(splits.validation.len(), 5);
        assert_eq!(splits.test.len(), 5);

        let narrow = Dataset::new(vec![vec![1.0, 2.0]], vec![1.0]).unwrap();
        assert!(Splits::from_datasets(narrow, dataset(10, 0.0), 0.5).is_err());
    }

    #[test]
    fn test_run_batch_covers_suite() {
        let splits = Splits::from_datasets(dataset(30, 0.0), dataset(12, 0.5), 0.5).unwrap();
        let penalty = Penalty::new(3.0).unwrap();
        let runner = ExperimentRunner::new(quick_params(), vec![penalty]);

        let outcomes = runner.run_batch(&splits, penalty).unwrap();
        assert_eq!(outcomes.len(), 6);
        for outcome in &outcomes {
            assert_eq!(outcome.report.total, splits.test.len());
            assert!(outcome.rounds >= 1);
            assert_eq!(outcome.penalty, penalty);
        }
        assert_eq!(outcomes[2].objective, "asym_squared");
        assert_eq!(outcomes[2].metric, "asym_squared");
    }

    #[test]
    fn test_unit_penalty_keeps_objective_label() {
        let splits = Splits::from_datasets(dataset(30, 0.0), dataset(12, 0.5), 0.5).unwrap();
        let runner = ExperimentRunner::new(quick_params(), vec![Penalty::SYMMETRIC]);

        let standard = runner
            .run(
                &splits,
                Penalty::SYMMETRIC,
                ExperimentSpec::new(ObjectiveKind::SquaredError, MetricKind::Mse),
            )
            .unwrap();
        let asymmetric = runner
            .run(
                &splits,
                Penalty::SYMMETRIC,
                ExperimentSpec::new(ObjectiveKind::AsymmetricSquared, MetricKind::Mse),
            )
            .unwrap();

        assert_eq!(standard.objective, "squared_error");
        assert_eq!(asymmetric.objective, "asym_squared");
    }

    #[test]
    fn test_run_rejects_non_positive_test_prices() {
        let mut test = dataset(10, 0.5);
        test.targets[9] = 0.0;
        let splits = Splits::from_datasets(dataset(20, 0.0), test, 0.5).unwrap();
        let runner = ExperimentRunner::new(quick_params(), vec![Penalty::SYMMETRIC]);

        let result = runner.run(
            &splits,
            Penalty::SYMMETRIC,
            ExperimentSpec::new(ObjectiveKind::SquaredError, MetricKind::Mae),
        );
        assert!(matches!(result, Err(TrainerError::Loss(_))));
    }

    #[test]
    fn test_from_config_validates() {
        let config = ExperimentConfig {
            penalties: vec![-3.0],
            ..ExperimentConfig::default()
        };
        assert!(ExperimentRunner::from_config(&config).is_err());

        let runner = ExperimentRunner::from_config(&ExperimentConfig::default()).unwrap();
        assert_eq!(runner.penalties().len(), 4);
        assert_eq!(runner.suite().len(), 6);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ExperimentOutcome {
            objective: "asym_squared".into(),
            metric: "mae".into(),
            penalty: Penalty::new(3.0).unwrap(),
            rounds: 4,
            best_score: Some(1.0),
            fingerprint: String::new(),
            report: OutcomeReport {
                winnings: 7.0,
                normalized_winnings: 0.7,
                over_predictions: 1,
                total: 2,
            },
        };
        let text = outcome.to_string();
        assert!(text.starts_with("== objective=asym_squared eval=mae penalty=3 rounds=4"));
        assert!(text.contains("Over-predictions: 1/2"));
    }
}
