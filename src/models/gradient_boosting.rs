//! Gradient boosted regression trees
//!
//! Squared-error boosting over deterministic regression trees: splits are
//! exact greedy choices between sorted threshold midpoints, so a fit on
//! the same rows always produces the same model regardless of row order
//! randomness or platform.

use crate::error::{ForecastError, Result};
use crate::models::Regression;
use ndarray::{Array1, Array2};
use std::cmp::Ordering;

const MIN_SSE_GAIN: f64 = 1e-12;

/// Gradient boosting hyperparameters; static defaults, not tuned per
/// dataset
#[derive(Debug, Clone)]
pub struct GradientBoostingParams {
    /// Number of boosting trees
    pub n_trees: usize,
    /// Shrinkage applied to every tree's contribution
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples in a node before a split is attempted
    pub min_samples_split: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_split: 2,
        }
    }
}

impl GradientBoostingParams {
    /// Check the hyperparameters for validity
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must be in (0, 1]".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Untrained gradient boosting model
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    params: GradientBoostingParams,
}

/// Trained gradient boosting model
#[derive(Debug, Clone)]
pub struct TrainedGradientBoosting {
    base_prediction: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Create a model with validated hyperparameters
    pub fn new(params: GradientBoostingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Fit the boosted ensemble on a design matrix and target vector
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedGradientBoosting> {
        let n = x.nrows();
        if n == 0 {
            return Err(ForecastError::DataError(
                "cannot fit gradient boosting on an empty dataset".to_string(),
            ));
        }
        if n != y.len() {
            return Err(ForecastError::DataError(format!(
                "feature rows ({}) don't match targets ({})",
                n,
                y.len()
            )));
        }

        let base_prediction = y.sum() / n as f64;
        let mut predictions = vec![base_prediction; n];
        let mut trees = Vec::with_capacity(self.params.n_trees);

        let rows: Vec<Vec<f64>> = (0..n).map(|i| x.row(i).to_vec()).collect();

        for _ in 0..self.params.n_trees {
            let residuals: Vec<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(target, prediction)| target - prediction)
                .collect();

            let tree = RegressionTree::fit(
                x,
                &residuals,
                self.params.max_depth,
                self.params.min_samples_split,
            );

            for (i, row) in rows.iter().enumerate() {
                predictions[i] += self.params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Ok(TrainedGradientBoosting {
            base_prediction,
            learning_rate: self.params.learning_rate,
            trees,
        })
    }
}

impl TrainedGradientBoosting {
    /// Number of fitted trees
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regression for TrainedGradientBoosting {
    fn predict_row(&self, features: &[f64]) -> f64 {
        self.base_prediction
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict_row(features))
                    .sum::<f64>()
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    fn fit(x: &Array2<f64>, targets: &[f64], max_depth: usize, min_samples_split: usize) -> Self {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        Self {
            root: build_node(x, targets, indices, 0, max_depth, min_samples_split),
        }
    }

    fn predict_row(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn build_node(
    x: &Array2<f64>,
    targets: &[f64],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    min_samples_split: usize,
) -> TreeNode {
    let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;

    if depth >= max_depth || indices.len() < min_samples_split {
        return TreeNode::Leaf { value: mean };
    }

    let parent_sse: f64 = indices
        .iter()
        .map(|&i| (targets[i] - mean).powi(2))
        .sum::<f64>();

    match best_split(x, targets, &indices, parent_sse) {
        None => TreeNode::Leaf { value: mean },
        Some((feature, threshold)) => {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| x[[i, feature]] < threshold);

            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(build_node(
                    x,
                    targets,
                    left_indices,
                    depth + 1,
                    max_depth,
                    min_samples_split,
                )),
                right: Box::new(build_node(
                    x,
                    targets,
                    right_indices,
                    depth + 1,
                    max_depth,
                    min_samples_split,
                )),
            }
        }
    }
}

/// Exact greedy search over the midpoints between consecutive distinct
/// feature values, minimizing the summed squared error of the two halves.
/// Ties keep the earliest feature and threshold, which makes the choice
/// deterministic.
fn best_split(
    x: &Array2<f64>,
    targets: &[f64],
    indices: &[usize],
    parent_sse: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(f64, usize, f64)> = None;

    for feature in 0..x.ncols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(Ordering::Equal)
        });

        // Prefix sums allow scanning every split position in one pass
        let total_sum: f64 = order.iter().map(|&i| targets[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| targets[i].powi(2)).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for split in 1..order.len() {
            let prev = order[split - 1];
            left_sum += targets[prev];
            left_sq += targets[prev].powi(2);

            let lower = x[[prev, feature]];
            let upper = x[[order[split], feature]];
            if upper <= lower {
                continue;
            }

            let left_n = split as f64;
            let right_n = (order.len() - split) as f64;
            let sse = (left_sq - left_sum.powi(2) / left_n)
                + ((total_sq - left_sq) - (total_sum - left_sum).powi(2) / right_n);

            if best.map_or(true, |(best_sse, _, _)| sse < best_sse) {
                best = Some((sse, feature, (lower + upper) / 2.0));
            }
        }
    }

    best.and_then(|(sse, feature, threshold)| {
        if parent_sse - sse > MIN_SSE_GAIN {
            Some((feature, threshold))
        } else {
            None
        }
    })
}
