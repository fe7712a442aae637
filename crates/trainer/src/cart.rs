//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy second-order regression trees fitted to gradient/hessian
//! pairs, with deterministic tie-breaking between equal-gain splits.

use pir_loss_core::GradientPair;

use crate::deterministic::SplitTieBreaker;
use crate::model::{Node, Tree};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 5,
            lambda: 1.0,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain
            || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Build a regression tree over a subset of rows
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    gradients: &'a [GradientPair],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<f64>], gradients: &'a [GradientPair], config: TreeConfig) -> Self {
        assert_eq!(features.len(), gradients.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            gradients,
            feature_count,
        }
    }

    /// Build a tree from the given row indices
    pub fn build(&self, rows: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(rows, 0, &mut nodes, 0);
        Tree { nodes }
    }

    /// Recursively build tree nodes
    fn build_node(&self, rows: &[usize], depth: usize, nodes: &mut Vec<Node>, node_id: usize) -> u32 {
        let current_idx = nodes.len() as u32;

        if depth >= self.config.max_depth || rows.len() < 2 * self.config.min_samples_leaf.max(1) {
            nodes.push(Node::leaf(self.leaf_value(rows)));
            return current_idx;
        }

        let Some(split) = self.find_best_split(rows, node_id) else {
            nodes.push(Node::leaf(self.leaf_value(rows)));
            return current_idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&row| self.features[row][split.feature_idx] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::split(split.feature_idx, split.threshold));

        let left_idx = self.build_node(&left_rows, depth + 1, nodes, node_id * 2 + 1);
        let right_idx = self.build_node(&right_rows, depth + 1, nodes, node_id * 2 + 2);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Best positive-gain split across all features, if any
    fn find_best_split(&self, rows: &[usize], node_id: usize) -> Option<SplitCandidate> {
        let (g_total, h_total) = self.sum_gradients(rows);
        let parent_score = self.score(g_total, h_total);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature_idx in 0..self.feature_count {
            sorted.sort_by(|&a, &b| {
                self.features[a][feature_idx]
                    .total_cmp(&self.features[b][feature_idx])
                    .then(a.cmp(&b))
            });

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            let mut rank = 0usize;

            for (pos, &row) in sorted.iter().enumerate().take(sorted.len() - 1) {
                g_left += self.gradients[row].grad;
                h_left += self.gradients[row].hess;

                let value = self.features[row][feature_idx];
                let next = self.features[sorted[pos + 1]][feature_idx];
                if value == next {
                    continue;
                }
                rank += 1;

                let left_count = pos + 1;
                if left_count < min_leaf || sorted.len() - left_count < min_leaf {
                    continue;
                }

                let gain = self.score(g_left, h_left)
                    + self.score(g_total - g_left, h_total - h_left)
                    - parent_score;
                if !(gain > 0.0) {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    threshold: value,
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, rank, node_id),
                };

                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Structure score G²/(H+λ)
    fn score(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.config.lambda;
        if denom > 0.0 {
            g * g / denom
        } else {
            0.0
        }
    }

    fn sum_gradients(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &row| {
            (g + self.gradients[row].grad, h + self.gradients[row].hess)
        })
    }

    /// Optimal leaf weight: -G/(H+λ)
    fn leaf_value(&self, rows: &[usize]) -> f64 {
        let (g, h) = self.sum_gradients(rows);
        let denom = h + self.config.lambda;
        if denom > 0.0 {
            -g / denom
        } else {
            0.0
        }
    }
}
