//! CSV dataset loading and preprocessing
//!
//! Reads numeric datasets whose last column is the price target, with an
//! optional header row, and provides deterministic shuffling and splitting.

use anyhow::{Context, Result};
use std::path::Path;

use crate::deterministic::hash_row;

/// Dataset with real-valued features and price targets
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub feature_count: usize,
    /// Column names when the file carried a header row (target included)
    pub columns: Option<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from rows already in memory
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            anyhow::bail!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            );
        }

        let feature_count = features.first().map_or(0, Vec::len);
        if let Some(row) = features.iter().position(|r| r.len() != feature_count) {
            anyhow::bail!(
                "Row {}: expected {} features, got {}",
                row,
                feature_count,
                features[row].len()
            );
        }

        if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
            anyhow::bail!("Row {}: non-finite target {}", row, targets[row]);
        }
        if let Some(row) = features
            .iter()
            .position(|r| r.iter().any(|v| !v.is_finite()))
        {
            anyhow::bail!("Row {}: non-finite feature value", row);
        }

        Ok(Self {
            features,
            targets,
            feature_count,
            columns: None,
        })
    }

    /// Load dataset from CSV file
    /// Expected format: feature1,feature2,...,price
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
        Self::from_csv_str(&content)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut feature_count = 0;
        let mut columns = None;

        for (line_idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if parts.len() < 2 {
                anyhow::bail!("Line {}: expected at least 2 columns", line_idx + 1);
            }

            // First data-bearing line is a header only if no cell is numeric
            if features.is_empty()
                && columns.is_none()
                && parts.iter().all(|p| p.parse::<f64>().is_err())
            {
                feature_count = parts.len() - 1;
                columns = Some(parts.iter().map(|p| p.to_string()).collect());
                continue;
            }

            if feature_count == 0 {
                feature_count = parts.len() - 1;
            } else if parts.len() - 1 != feature_count {
                anyhow::bail!(
                    "Line {}: expected {} features, got {}",
                    line_idx + 1,
                    feature_count,
                    parts.len() - 1
                );
            }

            let mut row_features = Vec::with_capacity(feature_count);
            for (i, part) in parts.iter().take(feature_count).enumerate() {
                row_features.push(parse_cell(part, line_idx + 1, i + 1)?);
            }

            let target = parse_cell(parts[feature_count], line_idx + 1, feature_count + 1)
                .context("invalid target")?;

            features.push(row_features);
            targets.push(target);
        }

        if features.is_empty() {
            anyhow::bail!("Dataset is empty");
        }

        Ok(Self {
            features,
            targets,
            feature_count,
            columns,
        })
    }

    /// Deterministically shuffle the dataset using seed
    pub fn shuffle(&mut self, seed: u64) {
        let mut order: Vec<(u64, usize)> = self
            .features
            .iter()
            .enumerate()
            .map(|(i, row)| (hash_row(row, seed ^ self.targets[i].to_bits()), i))
            .collect();

        // Index breaks ties between identical rows
        order.sort_unstable();

        let (features, targets): (Vec<Vec<f64>>, Vec<f64>) = order
            .into_iter()
            .map(|(_, idx)| (self.features[idx].clone(), self.targets[idx]))
            .unzip();

        self.features = features;
        self.targets = targets;
    }

    /// Split off the leading `fraction` of rows.
    ///
    /// Returns `(head, tail)`; both sides must end up non-empty.
    pub fn split(&self, fraction: f64) -> Result<(Dataset, Dataset)> {
        if !(fraction > 0.0 && fraction < 1.0) {
            anyhow::bail!("Split fraction must be in (0, 1), got {}", fraction);
        }

        let n = self.len();
        let head_len = (n as f64 * fraction).round() as usize;
        if head_len == 0 || head_len >= n {
            anyhow::bail!(
                "Splitting {} rows at {} leaves one side empty",
                n,
                fraction
            );
        }

        let head = Dataset {
            features: self.features[..head_len].to_vec(),
            targets: self.targets[..head_len].to_vec(),
            feature_count: self.feature_count,
            columns: self.columns.clone(),
        };
        let tail = Dataset {
            features: self.features[head_len..].to_vec(),
            targets: self.targets[head_len..].to_vec(),
            feature_count: self.feature_count,
            columns: self.columns.clone(),
        };

        Ok((head, tail))
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Per-feature (min, max)
    pub fn feature_stats(&self) -> Vec<(f64, f64)> {
        let mut stats = vec![(f64::INFINITY, f64::NEG_INFINITY); self.feature_count];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }

    /// Mean of the target column
    pub fn target_mean(&self) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        self.targets.iter().sum::<f64>() / self.targets.len() as f64
    }
}

/// Parse one CSV cell, rejecting NaN and infinities.
fn parse_cell(cell: &str, line: usize, column: usize) -> Result<f64> {
    let val = cell
        .parse::<f64>()
        .with_context(|| format!("Line {line}, column {column}: invalid number `{cell}`"))?;
    if !val.is_finite() {
        anyhow::bail!("Line {line}, column {column}: non-finite value `{cell}`");
    }
    Ok(val)
}
