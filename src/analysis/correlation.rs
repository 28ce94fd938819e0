/// Pearson correlation and scatter-plot point lists.

use serde::Serialize;
use tracing::debug;

use crate::analysis::aggregation::{resample_at_frequency, AggregationMethod, Frequency};
use crate::logging::Component;
use crate::model::{DatasetTable, Result};

/// Square, symmetric matrix of Pearson coefficients.
///
/// The diagonal is always 1.0. Off-diagonal entries are NaN when a pair has
/// fewer than two complete observations or one side has no variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient between two columns, if both are in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.values.len(), self.values.first().map(|r| r.len()).unwrap_or(0))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Pearson correlation over the rows where both sides are present.
pub fn pearson_pairwise(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Computes the correlation matrix for the selected columns.
///
/// Missing values are excluded pair by pair: a row missing in one column
/// only drops out of the pairs involving that column. Fails with
/// `InvalidArgument` for unknown or non-numeric columns.
pub fn correlation_matrix<S: AsRef<str>>(
    table: &DatasetTable,
    columns: &[S],
) -> Result<CorrelationMatrix> {
    let series = columns
        .iter()
        .map(|c| table.numeric_column(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let n = series.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson_pairwise(series[i], series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(
        component = %Component::Correlation,
        columns = n,
        rows = table.row_count(),
        "correlation matrix computed"
    );

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        values,
    })
}

/// Raw (x, y) points for one column pair, ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<(f64, f64)>,
}

/// Resamples the selected columns with the mean at `frequency` and emits
/// the point list of every unordered column pair.
///
/// Buckets where either column is missing are skipped for that pair.
pub fn scatter_series<S: AsRef<str>>(
    table: &DatasetTable,
    columns: &[S],
    frequency: Frequency,
) -> Result<Vec<ScatterSeries>> {
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let resampled = resample_at_frequency(table, &names, frequency, AggregationMethod::Mean)?;

    let mut out = Vec::new();
    for (i, x) in resampled.columns.iter().enumerate() {
        for y in &resampled.columns[i + 1..] {
            let points = x
                .values
                .iter()
                .zip(&y.values)
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            out.push(ScatterSeries {
                x_column: x.name.clone(),
                y_column: y.name.clone(),
                points,
            });
        }
    }
    Ok(out)
}
