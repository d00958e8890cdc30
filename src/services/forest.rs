//! Random forest regressor.
//!
//! Bagged CART trees with squared-error splits. Every tree is grown on a bootstrap
//! sample drawn from a seeded `StdRng`, so the same data and seed always yield the
//! same forest. Nodes live in a flat arena and link to children by index.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::FitError;
use crate::services::scaler::check_finite;
use crate::types::FEATURE_COUNT;

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Best split found for a node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    cost: f64,
}

/// A single regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(
        x: &[[f64; FEATURE_COUNT]],
        y: &[f64],
        samples: Vec<usize>,
        params: &ForestParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, samples, 0, params);
        tree
    }

    /// Append the subtree for `samples` and return its root index.
    fn grow(
        &mut self,
        x: &[[f64; FEATURE_COUNT]],
        y: &[f64],
        samples: Vec<usize>,
        depth: usize,
        params: &ForestParams,
    ) -> usize {
        let index = self.nodes.len();
        let value = samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64;
        self.nodes.push(Node::Leaf { value });

        if depth >= params.max_depth || samples.len() < params.min_samples_split {
            return index;
        }

        let Some(split) = Self::best_split(x, y, &samples, params.min_samples_leaf) else {
            return index;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_samples, depth + 1, params);
        let right = self.grow(x, y, right_samples, depth + 1, params);

        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    /// Lowest summed squared error split over all features, if any improves on the parent.
    fn best_split(
        x: &[[f64; FEATURE_COUNT]],
        y: &[f64],
        samples: &[usize],
        min_leaf: usize,
    ) -> Option<SplitCandidate> {
        let n = samples.len();
        let total_sum: f64 = samples.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = samples.iter().map(|&i| y[i] * y[i]).sum();
        let parent_cost = total_sq - total_sum * total_sum / n as f64;

        // Pure node
        if parent_cost <= 1e-12 * total_sq.max(1.0) {
            return None;
        }

        let mut best: Option<SplitCandidate> = None;
        let mut order: Vec<usize> = samples.to_vec();

        for feature in 0..FEATURE_COUNT {
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for split_at in 1..n {
                let moved = y[order[split_at - 1]];
                left_sum += moved;
                left_sq += moved * moved;

                let current = x[order[split_at - 1]][feature];
                let next = x[order[split_at]][feature];
                if next <= current {
                    continue;
                }
                if split_at < min_leaf || n - split_at < min_leaf {
                    continue;
                }

                let left_n = split_at as f64;
                let right_n = (n - split_at) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;

                let cost = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);

                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    let mut threshold = current + (next - current) / 2.0;
                    // Midpoint can round up to `next` for adjacent floats.
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        cost,
                    });
                }
            }
        }

        best.filter(|b| b.cost < parent_cost)
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Bagged ensemble of regression trees.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    params: ForestParams,
}

impl RandomForest {
    pub fn fit(
        x: &[[f64; FEATURE_COUNT]],
        y: &[f64],
        params: ForestParams,
    ) -> Result<Self, FitError> {
        if x.is_empty() {
            return Err(FitError::EmptyInput);
        }
        if x.len() != y.len() {
            return Err(FitError::ShapeMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        check_finite(x)?;
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(FitError::NonFinite {
                row,
                column: FEATURE_COUNT,
            });
        }
        if params.n_estimators == 0 {
            return Err(FitError::Aborted("n_estimators must be positive".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();

        let trees = (0..params.n_estimators)
            .map(|_| {
                let samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, samples, &params)
            })
            .collect();

        Ok(Self { trees, params })
    }

    /// Mean of the tree outputs.
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict_all(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 for an exact fit and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}
