/// Tree Ensemble Model
///
/// The trained forest is exported as flat per-tree node arrays (feature index,
/// threshold, left/right child, node value). Every tree is independently
/// queryable so the service can keep the full per-tree prediction distribution
/// for empirical confidence intervals, instead of only the ensemble's
/// aggregated output.
use crate::error::{AppError, Result};
use ndarray::Array1;
use serde::Deserialize;

/// A single regression tree in flat-array form.
///
/// Node `i` is a leaf when `left[i] < 0`; internal nodes route
/// `x[feature[i]] <= threshold[i]` to `left[i]`, otherwise `right[i]`.
/// Every node carries the training-time mean of its samples in `value[i]`,
/// which the explanation engine relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<f64>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.feature.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.threshold.len() != n
            || self.left.len() != n
            || self.right.len() != n
            || self.value.len() != n
        {
            return Err("tree node arrays have inconsistent lengths".to_string());
        }

        for i in 0..n {
            if !self.value[i].is_finite() {
                return Err(format!("non-finite value at node {}", i));
            }
            if self.left[i] < 0 {
                if self.right[i] >= 0 {
                    return Err(format!("half-leaf node {}", i));
                }
                continue;
            }
            // Children strictly after the parent guarantees termination.
            let (l, r) = (self.left[i] as usize, self.right[i] as usize);
            if l <= i || r <= i || l >= n || r >= n {
                return Err(format!("child index out of range at node {}", i));
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("feature index out of range at node {}", i));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("non-finite threshold at node {}", i));
            }
        }
        Ok(())
    }

    /// Scalar estimate for one encoded vector.
    pub fn predict_one(&self, x: &Array1<f64>) -> f64 {
        let mut node = 0usize;
        while self.left[node] >= 0 {
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        self.value[node]
    }

    /// Walk the decision path and credit each split's value change to the
    /// split feature. The accumulated contributions sum to
    /// `leaf value - root value` exactly.
    pub fn path_attributions(&self, x: &Array1<f64>, acc: &mut Array1<f64>) {
        let mut node = 0usize;
        while self.left[node] >= 0 {
            let f = self.feature[node] as usize;
            let next = if x[f] <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
            acc[f] += self.value[next] - self.value[node];
            node = next;
        }
    }

    fn root_value(&self) -> f64 {
        self.value[0]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    /// Deserialize and validate an exported ensemble.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let ensemble: TreeEnsemble = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactCorrupt(format!("ensemble model: {}", e)))?;
        ensemble.validate()?;
        Ok(ensemble)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AppError::ArtifactCorrupt(
                "ensemble model has no trees".to_string(),
            ));
        }
        if self.n_features == 0 {
            return Err(AppError::ArtifactCorrupt(
                "ensemble model declares zero features".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| AppError::ArtifactCorrupt(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// One estimate per tree, in tree order.
    pub fn tree_predictions(&self, x: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(self.trees.iter().map(|t| t.predict_one(x)))
    }

    /// Mean of the trees' root values: the ensemble's expected value before
    /// any feature is observed.
    pub fn baseline(&self) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.root_value()).sum();
        sum / self.trees.len() as f64
    }
}
