/// Z-score outlier detection.
///
/// For each requested column the mean and sample standard deviation are
/// computed over the observed values; every row gets z = (x − μ) / σ and is
/// flagged when |z| is strictly greater than the threshold. A column with
/// zero (or undefined) spread yields NaN z-scores and no flags.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::stats::{exceeds_threshold, ColumnMoments};
use crate::logging::Component;
use crate::model::{AnalysisError, Column, DatasetTable, Result};

/// Conventional cut-off: three standard deviations.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Suffix of the derived z-score column.
pub const ZSCORE_SUFFIX: &str = "_zscore";
/// Suffix of the derived outlier flag column.
pub const OUTLIER_SUFFIX: &str = "_outlier";

// ---------------------------------------------------------------------------
// Per-column scores
// ---------------------------------------------------------------------------

/// Z-scores and flags for one column.
///
/// `z_scores[i]` is `None` where the input was missing and `Some(NaN)` when
/// the column is degenerate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnZScores {
    pub column: String,
    pub moments: ColumnMoments,
    pub z_scores: Vec<Option<f64>>,
    pub flagged: Vec<bool>,
}

impl ColumnZScores {
    /// Row indices whose |z| exceeded the threshold.
    pub fn flagged_rows(&self) -> Vec<usize> {
        self.flagged
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.iter().filter(|&&f| f).count()
    }
}

/// Scores a single column. Shared with the remediator so both agree on
/// which rows are outliers.
pub(crate) fn score_column(name: &str, values: &[Option<f64>], threshold: f64) -> ColumnZScores {
    let moments = ColumnMoments::of(values);
    if moments.is_degenerate() && moments.count > 0 {
        warn!(
            component = %Component::Outliers,
            column = name,
            observations = moments.count,
            "zero or undefined standard deviation; z-scores are NaN"
        );
    }

    let z_scores: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()).map(|x| moments.z_score(x)))
        .collect();
    let flagged = z_scores
        .iter()
        .map(|z| z.is_some_and(|z| exceeds_threshold(z, threshold)))
        .collect();

    ColumnZScores { column: name.to_string(), moments, z_scores, flagged }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AnalysisError::InvalidArgument(format!(
            "z-score threshold must be a finite non-negative number, got {}",
            threshold
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Output of `compute_z_scores`: a derived table (original columns plus
/// `<col>_zscore` / `<col>_outlier` per requested column, overwriting any
/// existing columns of those names) and the raw per-column scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreResult {
    pub threshold: f64,
    pub scores: Vec<ColumnZScores>,
    table: DatasetTable,
}

impl ZScoreResult {
    pub fn table(&self) -> &DatasetTable {
        &self.table
    }

    pub fn into_table(self) -> DatasetTable {
        self.table
    }

    pub fn column(&self, name: &str) -> Option<&ColumnZScores> {
        self.scores.iter().find(|s| s.column == name)
    }

    /// Rows flagged in at least one scored column.
    pub fn flagged_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.scores.iter().flat_map(|s| s.flagged_rows()).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }
}

/// Computes z-scores and outlier flags for the requested columns.
///
/// Fails with `InvalidArgument` if any requested column is missing from the
/// table or not numeric, or if the threshold is negative / non-finite.
/// Validation happens before any scoring. Repeated column names are scored
/// once.
pub fn compute_z_scores<S: AsRef<str>>(
    table: &DatasetTable,
    columns: &[S],
    threshold: f64,
) -> Result<ZScoreResult> {
    validate_threshold(threshold)?;

    let mut requested: Vec<&str> = Vec::with_capacity(columns.len());
    for name in columns.iter().map(|c| c.as_ref()) {
        if !requested.contains(&name) {
            table.numeric_column(name)?;
            requested.push(name);
        }
    }

    let mut derived = table.clone();
    let mut scores = Vec::with_capacity(requested.len());
    for name in requested {
        let values = table.numeric_column(name)?;
        let score = score_column(name, values, threshold);

        derived.set_column(Column::numeric(
            format!("{}{}", name, ZSCORE_SUFFIX),
            score.z_scores.clone(),
        ))?;
        derived.set_column(Column::flag(
            format!("{}{}", name, OUTLIER_SUFFIX),
            score.flagged.iter().copied().map(Some).collect(),
        ))?;

        debug!(
            component = %Component::Outliers,
            column = name,
            mean = score.moments.mean,
            std_dev = score.moments.std_dev,
            flagged = score.flagged_count(),
            "column scored"
        );
        scores.push(score);
    }

    Ok(ZScoreResult { threshold, scores, table: derived })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnValues;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn hourly(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2021, 8, 9)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn table_of(name: &str, values: &[f64]) -> DatasetTable {
        DatasetTable::new(hourly(values.len()), vec![Column::from_f64(name, values)])
            .expect("valid table")
    }

    #[test]
    fn test_one_to_five_with_threshold_one_flags_the_extremes() {
        let table = table_of("GHI", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = compute_z_scores(&table, &["GHI"], 1.0).expect("numeric column");
        let ghi = result.column("GHI").expect("scored");

        assert!((ghi.moments.mean - 3.0).abs() < 1e-12);
        assert!((ghi.moments.std_dev - 1.5811388).abs() < 1e-6);

        let expected = [-1.264911, -0.632456, 0.0, 0.632456, 1.264911];
        for (z, want) in ghi.z_scores.iter().zip(expected) {
            let z = z.expect("no missing input");
            assert!((z - want).abs() < 1e-5, "z = {}, expected {}", z, want);
        }
        assert_eq!(ghi.flagged_rows(), vec![0, 4]);
    }

    #[test]
    fn test_constant_column_flags_nothing_even_at_zero_threshold() {
        let table = table_of("Tamb", &[25.0, 25.0, 25.0, 25.0]);
        let result = compute_z_scores(&table, &["Tamb"], 0.0).expect("numeric column");
        let tamb = result.column("Tamb").expect("scored");
        assert!(tamb.z_scores.iter().all(|z| z.is_some_and(f64::is_nan)));
        assert_eq!(tamb.flagged_count(), 0);
    }

    #[test]
    fn test_missing_values_are_excluded_from_stats_but_kept_in_output() {
        let table = DatasetTable::new(
            hourly(4),
            vec![Column::numeric("WS", vec![Some(1.0), None, Some(3.0), Some(5.0)])],
        )
        .expect("valid table");
        let result = compute_z_scores(&table, &["WS"], DEFAULT_Z_THRESHOLD).expect("numeric");
        let ws = result.column("WS").expect("scored");
        assert_eq!(ws.moments.count, 3);
        assert!((ws.moments.mean - 3.0).abs() < 1e-12);
        assert_eq!(ws.z_scores[1], None);
        assert!(!ws.flagged[1]);
    }

    #[test]
    fn test_derived_table_appends_score_and_flag_columns() {
        let table = table_of("GHI", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = compute_z_scores(&table, &["GHI", "GHI"], 1.0).expect("numeric column");
        assert_eq!(
            result.table().column_names(),
            vec!["GHI", "GHI_zscore", "GHI_outlier"]
        );
        match &result.table().column("GHI_outlier").expect("flag column").values {
            ColumnValues::Flag(flags) => assert_eq!(
                flags,
                &vec![Some(true), Some(false), Some(false), Some(false), Some(true)]
            ),
            other => panic!("expected flag column, got {:?}", other),
        }
        assert_eq!(table.column_names(), vec!["GHI"], "input table must be untouched");
    }

    #[test]
    fn test_rescoring_a_derived_table_overwrites_score_columns() {
        let table = table_of("GHI", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let first = compute_z_scores(&table, &["GHI"], 1.0).expect("numeric column");
        let second = compute_z_scores(first.table(), &["GHI"], 2.0)
            .expect("existing score columns must not block re-scoring");

        assert_eq!(
            second.table().column_names(),
            vec!["GHI", "GHI_zscore", "GHI_outlier"],
            "derived columns are replaced in place, not duplicated"
        );
        match &second.table().column("GHI_outlier").expect("flag column").values {
            ColumnValues::Flag(flags) => assert!(flags.iter().all(|f| *f == Some(false))),
            other => panic!("expected flag column, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_column_is_rejected_before_scoring() {
        let table = DatasetTable::new(
            hourly(2),
            vec![
                Column::from_f64("GHI", &[1.0, 2.0]),
                Column::text("Comments", vec![None, Some("x".to_string())]),
            ],
        )
        .expect("valid table");
        let result = compute_z_scores(&table, &["GHI", "Comments"], 3.0);
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let table = table_of("GHI", &[1.0, 2.0]);
        assert!(matches!(
            compute_z_scores(&table, &["GHI"], -1.0),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_no_requested_columns_returns_input_shape() {
        let table = table_of("GHI", &[1.0, 2.0]);
        let result = compute_z_scores::<&str>(&table, &[], 3.0).expect("empty selection is fine");
        assert!(result.scores.is_empty());
        assert_eq!(result.table(), &table);
    }
}
