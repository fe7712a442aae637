//! Experiment configuration
//!
//! Loaded from TOML, then overridden from the environment and finally from
//! the command line. Penalties are validated here, before any training runs.

use pir_loss_core::Penalty;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::TrainerError;
use crate::trainer::TrainingParams;

pub const ENV_PENALTIES: &str = "PIR_PENALTIES";
pub const ENV_VALIDATION_FRACTION: &str = "PIR_VALIDATION_FRACTION";

/// Top-level experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub training: TrainingParams,
    /// Over-prediction penalties swept across experiment batches
    pub penalties: Vec<f64>,
    /// Share of the test file used as the early-stopping split
    pub validation_fraction: f64,
    /// Shuffle the test file before splitting it
    pub shuffle_seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            training: TrainingParams::default(),
            penalties: vec![3.0, 5.0, 10.0, 12.0],
            validation_fraction: 0.5,
            shuffle_seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded experiment config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TrainerError> {
        toml::from_str(content)
            .map_err(|e| TrainerError::Config(format!("failed to parse config: {e}")))
    }

    /// Apply `PIR_PENALTIES` / `PIR_VALIDATION_FRACTION` from the environment
    pub fn apply_env_overrides(&mut self) -> Result<(), TrainerError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), TrainerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PENALTIES) {
            self.penalties = parse_penalty_list(&raw)?;
            info!("{} override: {:?}", ENV_PENALTIES, self.penalties);
        }

        if let Some(raw) = lookup(ENV_VALIDATION_FRACTION) {
            self.validation_fraction = raw.trim().parse().map_err(|_| {
                TrainerError::Config(format!("{ENV_VALIDATION_FRACTION}: invalid number `{raw}`"))
            })?;
        }

        Ok(())
    }

    /// Validated penalty coefficients, in configured order
    pub fn penalties(&self) -> Result<Vec<Penalty>, TrainerError> {
        self.penalties
            .iter()
            .map(|&p| Penalty::new(p).map_err(|e| TrainerError::Config(e.to_string())))
            .collect()
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.penalties.is_empty() {
            return Err(TrainerError::Config("at least one penalty is required".into()));
        }
        let penalties = self.penalties()?;
        if penalties.iter().any(|p| p.is_symmetric()) {
            warn!("penalty 1.0 makes the asymmetric losses symmetric");
        }

        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(TrainerError::Config(format!(
                "validation_fraction must be in (0, 1), got {}",
                self.validation_fraction
            )));
        }

        self.training.validate()
    }
}

/// Parse a comma separated list such as `3,5,10,12`
pub fn parse_penalty_list(raw: &str) -> Result<Vec<f64>, TrainerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| TrainerError::Config(format!("invalid penalty `{s}`")))
        })
        .collect()
}
