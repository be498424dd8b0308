/// Explanation Engine
///
/// Decision-path attribution over the same trees the prediction uses: every
/// split on a tree's decision path credits `value[child] - value[parent]` to
/// the split feature, and per-tree contributions are averaged across the
/// ensemble. Attributions therefore sum to (prediction - baseline) exactly,
/// where the baseline is the mean root value of the trees.
///
/// The explainer is built once at startup against the loaded ensemble and
/// cached for the process lifetime. Output is advisory; any failure here
/// degrades to "explanation unavailable" without touching the numeric
/// prediction.
use crate::artifacts::ensemble::TreeEnsemble;
use crate::error::{AppError, Result};
use ndarray::Array1;

/// Accept the artifact baseline when it is within 10% of the loaded
/// ensemble's root mean; a larger gap means the artifact belongs to a
/// different model generation.
const BASELINE_DRIFT_TOLERANCE: f64 = 0.10;

#[derive(Debug, Clone)]
pub struct PathExplainer {
    baseline: f64,
}

impl PathExplainer {
    /// Validate the serialized explainer against the loaded ensemble.
    pub fn build(ensemble: &TreeEnsemble, expected_value: f64) -> Result<Self> {
        if !expected_value.is_finite() {
            return Err(AppError::ExplainerUnavailable(
                "explainer baseline is not finite".to_string(),
            ));
        }

        let baseline = ensemble.baseline();
        let tolerance = baseline.abs().max(1.0) * BASELINE_DRIFT_TOLERANCE;
        if (expected_value - baseline).abs() > tolerance {
            return Err(AppError::ExplainerUnavailable(
                "explainer baseline does not match the loaded model".to_string(),
            ));
        }

        Ok(Self { baseline })
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Per-feature attributions for one encoded vector, in schema order.
    pub fn explain(&self, x: &Array1<f64>, ensemble: &TreeEnsemble) -> Result<Array1<f64>> {
        if x.len() != ensemble.n_features {
            return Err(AppError::ExplainerUnavailable(format!(
                "feature vector has {} values, model expects {}",
                x.len(),
                ensemble.n_features
            )));
        }

        let mut total = Array1::zeros(ensemble.n_features);
        for tree in &ensemble.trees {
            tree.path_attributions(x, &mut total);
        }
        let n = ensemble.tree_count() as f64;
        total.mapv_inplace(|v| v / n);
        Ok(total)
    }
}
