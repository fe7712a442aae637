//! Boosted regression tree ensemble produced by the trainer

use serde::{Deserialize, Serialize};

use crate::errors::TrainerError;

/// A decision tree node (internal or leaf)
///
/// Internal nodes route a row left when `row[feature_index] <= threshold`.
/// Leaf nodes carry `value` and ignore the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub feature_index: u32,
    pub threshold: f64,
    pub left: u32,
    pub right: u32,
    pub value: Option<f64>,
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }

    /// Split node; children are patched in once they are built
    pub fn split(feature_index: usize, threshold: f64) -> Self {
        Self {
            feature_index: feature_index as u32,
            threshold,
            left: 0,
            right: 0,
            value: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }
}

/// A single regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Raw leaf output for a row. Malformed trees evaluate to zero.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if let Some(value) = node.value {
                return value;
            }

            let Some(&feature_value) = features.get(node.feature_index as usize) else {
                return 0.0;
            };

            idx = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

/// Training provenance kept alongside the ensemble
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub objective: String,
    pub eval_metric: Option<String>,
    pub feature_count: usize,
    /// Zero-based round with the best validation score
    pub best_iteration: Option<usize>,
    pub best_score: Option<f64>,
    /// Validation score after every round that was trained
    pub eval_history: Vec<f64>,
    pub trained_at: i64,
}

/// Gradient boosted ensemble: `base_score + learning_rate * Σ tree(row)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub base_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
    pub metadata: ModelMetadata,
}

impl Model {
    pub fn predict(&self, features: &[f64]) -> f64 {
        let boost: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        self.base_score + self.learning_rate * boost
    }

    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// BLAKE3 hex digest of the ensemble, excluding timestamps and history.
    pub fn fingerprint(&self) -> Result<String, TrainerError> {
        let bytes = serde_json::to_vec(&(self.base_score, self.learning_rate, &self.trees))
            .map_err(|e| TrainerError::Training(format!("failed to encode model: {e}")))?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, left: f64, right: f64) -> Tree {
        let mut root = Node::split(0, threshold);
        root.left = 1;
        root.right = 2;
        Tree {
            nodes: vec![root, Node::leaf(left), Node::leaf(right)],
        }
    }

    #[test]
    fn test_tree_routing() {
        let tree = stump(5.0, -1.0, 1.0);
        assert_eq!(tree.evaluate(&[4.0]), -1.0);
        assert_eq!(tree.evaluate(&[5.0]), -1.0);
        assert_eq!(tree.evaluate(&[5.5]), 1.0);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_malformed_tree_is_zero() {
        assert_eq!(Tree::default().evaluate(&[1.0]), 0.0);
        assert_eq!(stump(1.0, 2.0, 3.0).evaluate(&[]), 0.0);
    }

    #[test]
    fn test_model_prediction() {
        let model = Model {
            base_score: 10.0,
            learning_rate: 0.5,
            trees: vec![stump(5.0, -2.0, 4.0), stump(5.0, -2.0, 4.0)],
            metadata: ModelMetadata::default(),
        };

        assert_eq!(model.predict(&[1.0]), 8.0);
        assert_eq!(model.predict_batch(&[vec![1.0], vec![9.0]]), vec![8.0, 14.0]);
    }

    #[test]
    fn test_fingerprint_ignores_metadata() {
        let mut a = Model {
            base_score: 1.0,
            learning_rate: 0.1,
            trees: vec![stump(2.0, 0.0, 1.0)],
            metadata: ModelMetadata::default(),
        };
        let mut b = a.clone();
        b.metadata.trained_at = 12345;
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        a.base_score = 2.0;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
