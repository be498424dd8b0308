/// Prediction Service
///
/// Queries every tree of the ensemble independently on the same encoded
/// vector, then aggregates: point estimate is the arithmetic mean, and the
/// 90% interval is the empirical [p5, p95] over the per-tree estimates with
/// linear-interpolated percentiles. The full per-tree distribution is
/// required; the ensemble's aggregated output alone cannot produce empirical
/// percentiles.
///
/// Pure function of (vector, model); no side effects, no I/O.
use crate::artifacts::ensemble::TreeEnsemble;
use crate::error::{AppError, Result};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

pub fn predict(x: &Array1<f64>, ensemble: &TreeEnsemble) -> Result<PredictionResult> {
    if x.len() != ensemble.n_features {
        return Err(AppError::InvalidFeatureVector(format!(
            "expected {} features, got {}",
            ensemble.n_features,
            x.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AppError::InvalidFeatureVector(
            "feature vector contains non-finite values".to_string(),
        ));
    }

    let tree_preds = ensemble.tree_predictions(x);
    let point_estimate = tree_preds
        .mean()
        .ok_or_else(|| AppError::ModelUnavailable("ensemble has no trees".to_string()))?;

    let mut sorted = tree_preds.to_vec();
    // Tree values are validated finite at load, so total_cmp is safe here.
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(PredictionResult {
        point_estimate,
        lower_bound: percentile(&sorted, 5.0),
        upper_bound: percentile(&sorted, 95.0),
    })
}

/// Linear-interpolated percentile over pre-sorted samples (numpy's default
/// method), not nearest-rank.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q / 100.0;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
