//! Penalty coefficient applied to over-predictions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LossError, Result};

/// Multiplier applied to the loss whenever a prediction exceeds its truth.
///
/// Always finite and strictly positive. A value of `1.0` makes every
/// asymmetric loss collapse to its symmetric counterpart.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Penalty(f64);

impl Penalty {
    /// No asymmetry: over- and under-predictions cost the same.
    pub const SYMMETRIC: Penalty = Penalty(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(LossError::InvalidPenalty(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_symmetric(self) -> bool {
        self.0 == 1.0
    }
}

impl Default for Penalty {
    fn default() -> Self {
        Self::SYMMETRIC
    }
}

impl TryFrom<f64> for Penalty {
    type Error = LossError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Penalty> for f64 {
    fn from(penalty: Penalty) -> f64 {
        penalty.0
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
