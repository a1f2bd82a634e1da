//! Linear-interpolation quantile summaries of replicate batches.

/// Default probe levels: symmetric tail and near-median pairs, ordered
/// from the widest pair inward.
pub const DEFAULT_LEVELS: [f64; 12] = [
    0.1, 0.9, 0.01, 0.99, 0.001, 0.999, 0.0001, 0.9999, 0.00001, 0.99999, 0.000001, 0.999999,
];

/// Quantile of pre-sorted data at level `p`, interpolating linearly between
/// order statistics at position `p × (n − 1)` (the R-7 estimator, the
/// default in R and NumPy).
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();
    if j + 1 >= n {
        sorted[n - 1]
    } else {
        (1.0 - g) * sorted[j] + g * sorted[j + 1]
    }
}

/// Compute one quantile per requested level, in level order, over a
/// non-empty batch of final frequencies. An all-equal batch is fine; every
/// level then reports that constant.
pub fn compute_quantiles(batch: &[f64], levels: &[f64]) -> Vec<f64> {
    debug_assert!(!batch.is_empty());
    let mut sorted = batch.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    levels.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
}
