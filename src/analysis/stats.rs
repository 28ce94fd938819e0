/// Shared statistic definitions.
///
/// The outlier detector and the remediator must agree exactly on what
/// "mean", "sample standard deviation" and "z-score" mean, so both go
/// through these helpers. Missing values are always excluded.

use serde::Serialize;

/// Collects the observed (non-missing, non-NaN) values of a column.
pub fn observed(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().filter(|x| !x.is_nan()).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (divisor n − 1). `None` when n < 2.
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    // Constant columns get an exact zero; floating-point drift in the
    // mean would otherwise leave a tiny positive spread.
    if values.iter().all(|&x| x == values[0]) {
        return Some(0.0);
    }
    let sum_sq: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_copy(values);
    quantile_sorted(&sorted, 0.5)
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolated quantile over already-sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ---------------------------------------------------------------------------
// Column moments and z-scores
// ---------------------------------------------------------------------------

/// Location and spread of one column.
///
/// `mean` is NaN for a column with no observations; `std_dev` is NaN when
/// fewer than two observations exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnMoments {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnMoments {
    pub fn of(values: &[Option<f64>]) -> Self {
        let observed = observed(values);
        let mean = mean(&observed).unwrap_or(f64::NAN);
        let std_dev = sample_std(&observed, mean).unwrap_or(f64::NAN);
        ColumnMoments { count: observed.len(), mean, std_dev }
    }

    /// True when z-scores cannot be computed (σ zero or undefined).
    pub fn is_degenerate(&self) -> bool {
        self.std_dev.is_nan() || self.std_dev == 0.0
    }

    /// z = (x − μ) / σ, or NaN for a degenerate column.
    pub fn z_score(&self, x: f64) -> f64 {
        if self.is_degenerate() {
            f64::NAN
        } else {
            (x - self.mean) / self.std_dev
        }
    }
}

/// Strict comparison: |z| > threshold. NaN is never an outlier.
pub fn exceeds_threshold(z: f64, threshold: f64) -> bool {
    z.abs() > threshold
}
