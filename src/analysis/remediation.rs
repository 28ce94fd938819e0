/// Outlier remediation: range clipping, outlier replacement and
/// negative-value zeroing.
///
/// Every function returns a new table; the input is never modified.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::outliers::{score_column, validate_threshold};
use crate::analysis::stats::{median, observed};
use crate::logging::{log_operation_summary, Component};
use crate::model::{AnalysisError, ColumnValues, DatasetTable, Result};
use crate::sensors::SENSOR_REGISTRY;

// ---------------------------------------------------------------------------
// Range specification
// ---------------------------------------------------------------------------

/// Physical (min, max) bounds per column, used by `clip`.
///
/// Bounds are validated on insertion: both finite and min <= max.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RangeSpec {
    bounds: BTreeMap<String, (f64, f64)>,
}

impl RangeSpec {
    pub fn new() -> Self {
        RangeSpec::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, min: f64, max: f64) -> Result<()> {
        let column = column.into();
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(AnalysisError::InvalidArgument(format!(
                "invalid range for {}: ({}, {})",
                column, min, max
            )));
        }
        self.bounds.insert(column, (min, max));
        Ok(())
    }

    /// Builder form of `insert`.
    pub fn with(mut self, column: impl Into<String>, min: f64, max: f64) -> Result<Self> {
        self.insert(column, min, max)?;
        Ok(self)
    }

    pub fn get(&self, column: &str) -> Option<(f64, f64)> {
        self.bounds.get(column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.bounds.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Bounds for every column in the sensor registry.
    pub fn physical_defaults() -> Self {
        RangeSpec {
            bounds: SENSOR_REGISTRY
                .iter()
                .map(|s| (s.name.to_string(), s.bounds))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Replacement method
// ---------------------------------------------------------------------------

/// Statistic written over flagged outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ReplacementMethod {
    Mean,
    #[default]
    Median,
}

impl FromStr for ReplacementMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ReplacementMethod::Mean),
            "median" => Ok(ReplacementMethod::Median),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unsupported replacement method: {} (expected mean or median)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ReplacementMethod {
    type Error = AnalysisError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for ReplacementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementMethod::Mean => write!(f, "mean"),
            ReplacementMethod::Median => write!(f, "median"),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Clamps numeric columns named in `ranges` into their bounds.
///
/// Range keys that are not in the table are ignored, as are non-numeric
/// columns. Missing cells stay missing; all other columns are copied as-is.
pub fn clip(table: &DatasetTable, ranges: &RangeSpec) -> DatasetTable {
    let mut clamped = 0usize;
    let result = table.map_columns(|column| match (&column.values, ranges.get(&column.name)) {
        (ColumnValues::Numeric(values), Some((min, max))) => ColumnValues::Numeric(
            values
                .iter()
                .map(|v| {
                    v.map(|x| {
                        if x < min || x > max {
                            clamped += 1;
                        }
                        x.clamp(min, max)
                    })
                })
                .collect(),
        ),
        (values, _) => values.clone(),
    });

    log_operation_summary(Component::Remediation, "clip", clip_candidates(table, ranges), clamped);
    result
}

/// Cells `clip` can touch: every row of each numeric column that has a range.
fn clip_candidates(table: &DatasetTable, ranges: &RangeSpec) -> usize {
    let covered = table
        .numeric_column_names()
        .into_iter()
        .filter(|name| ranges.get(name).is_some())
        .count();
    table.row_count() * covered
}

/// Overwrites z-score outliers in every numeric column with the column's
/// mean or median.
///
/// Each column is handled independently: its z-scores, mean and median are
/// all taken from the original values, outliers included, before anything
/// is replaced.
pub fn replace_outliers(
    table: &DatasetTable,
    method: ReplacementMethod,
    threshold: f64,
) -> Result<DatasetTable> {
    validate_threshold(threshold)?;

    let mut replaced = 0usize;
    let result = table.map_columns(|column| {
        let ColumnValues::Numeric(values) = &column.values else {
            return column.values.clone();
        };
        let scores = score_column(&column.name, values, threshold);
        if scores.flagged_count() == 0 {
            return column.values.clone();
        }

        let fill = match method {
            ReplacementMethod::Mean => scores.moments.mean,
            ReplacementMethod::Median => median(&observed(values)).unwrap_or(f64::NAN),
        };
        debug!(
            component = %Component::Remediation,
            column = %column.name,
            %method,
            fill,
            outliers = scores.flagged_count(),
            "replacing outliers"
        );
        replaced += scores.flagged_count();

        ColumnValues::Numeric(
            values
                .iter()
                .zip(&scores.flagged)
                .map(|(v, &flagged)| if flagged { Some(fill) } else { *v })
                .collect(),
        )
    });

    log_operation_summary(
        Component::Remediation,
        "replace_outliers",
        table.row_count() * table.numeric_column_names().len(),
        replaced,
    );
    Ok(result)
}

/// Sets every negative numeric value to zero.
pub fn zero_negatives(table: &DatasetTable) -> DatasetTable {
    let mut zeroed = 0usize;
    let result = table.map_columns(|column| match &column.values {
        ColumnValues::Numeric(values) => ColumnValues::Numeric(
            values
                .iter()
                .map(|v| {
                    v.map(|x| {
                        if x < 0.0 {
                            zeroed += 1;
                            0.0
                        } else {
                            x
                        }
                    })
                })
                .collect(),
        ),
        other => other.clone(),
    });

    log_operation_summary(
        Component::Remediation,
        "zero_negatives",
        table.row_count() * table.numeric_column_names().len(),
        zeroed,
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn minutes(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2021, 8, 9)
            .and_then(|d| d.and_hms_opt(0, 1, 0))
            .expect("valid timestamp");
        (0..n).map(|i| start + Duration::minutes(i as i64)).collect()
    }

    fn values_of<'a>(table: &'a DatasetTable, name: &str) -> &'a [Option<f64>] {
        table.numeric_column(name).expect("numeric column")
    }

    // --- clip ---------------------------------------------------------------

    #[test]
    fn test_clip_clamps_into_range_and_leaves_other_columns_alone() {
        let table = DatasetTable::new(
            minutes(3),
            vec![
                Column::from_f64("GHI", &[-5.0, 50.0, 1200.0]),
                Column::from_f64("Tamb", &[-5.0, 50.0, 1200.0]),
            ],
        )
        .expect("valid table");
        let ranges = RangeSpec::new().with("GHI", 0.0, 1000.0).expect("valid range");

        let clipped = clip(&table, &ranges);
        assert_eq!(values_of(&clipped, "GHI"), &[Some(0.0), Some(50.0), Some(1000.0)]);
        assert_eq!(clipped.column("Tamb"), table.column("Tamb"));
    }

    #[test]
    fn test_clip_ignores_unknown_range_keys() {
        let table = DatasetTable::new(minutes(2), vec![Column::from_f64("GHI", &[1.0, 2.0])])
            .expect("valid table");
        let ranges = RangeSpec::new().with("NotAColumn", 0.0, 1.0).expect("valid range");
        assert_eq!(clip(&table, &ranges), table);
    }

    #[test]
    fn test_clip_candidates_count_only_ranged_numeric_columns() {
        let table = DatasetTable::new(
            minutes(4),
            vec![
                Column::from_f64("GHI", &[1.0, 2.0, 3.0, 4.0]),
                Column::from_f64("Unlisted", &[1.0, 2.0, 3.0, 4.0]),
                Column::text("Comments", vec![None; 4]),
            ],
        )
        .expect("valid table");

        let defaults = RangeSpec::physical_defaults();
        assert!(defaults.len() > 1);
        assert_eq!(clip_candidates(&table, &defaults), 4, "only GHI is both ranged and present");
        assert_eq!(clip_candidates(&table, &RangeSpec::new()), 0);
    }

    #[test]
    fn test_range_spec_rejects_inverted_bounds() {
        let result = RangeSpec::new().with("GHI", 10.0, 0.0);
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    // --- replace_outliers ---------------------------------------------------

    fn spiky_table() -> DatasetTable {
        // Nineteen readings of 10 and one spike of 100.
        let mut values = vec![10.0; 19];
        values.push(100.0);
        DatasetTable::new(minutes(20), vec![Column::from_f64("WS", &values)])
            .expect("valid table")
    }

    #[test]
    fn test_replace_with_median_uses_original_column() {
        let cleaned = replace_outliers(&spiky_table(), ReplacementMethod::Median, 3.0)
            .expect("valid threshold");
        let ws = values_of(&cleaned, "WS");
        assert_eq!(ws[19], Some(10.0));
        assert!(ws[..19].iter().all(|v| *v == Some(10.0)));
    }

    #[test]
    fn test_replace_with_mean_includes_the_outlier_itself() {
        let cleaned = replace_outliers(&spiky_table(), ReplacementMethod::Mean, 3.0)
            .expect("valid threshold");
        let expected_mean = (10.0 * 19.0 + 100.0) / 20.0;
        let replaced = values_of(&cleaned, "WS")[19].expect("not missing");
        assert!(
            (replaced - expected_mean).abs() < 1e-12,
            "mean must be taken before replacement, got {}",
            replaced
        );
    }

    #[test]
    fn test_columns_are_remediated_independently() {
        let mut spiky = vec![10.0; 19];
        spiky.push(100.0);
        let calm: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let table = DatasetTable::new(
            minutes(20),
            vec![Column::from_f64("WS", &spiky), Column::from_f64("Tamb", &calm)],
        )
        .expect("valid table");

        let cleaned = replace_outliers(&table, ReplacementMethod::Median, 3.0)
            .expect("valid threshold");
        assert_eq!(cleaned.column("Tamb"), table.column("Tamb"));
    }

    #[test]
    fn test_replacement_method_parsing() {
        assert_eq!("Mean".parse::<ReplacementMethod>().ok(), Some(ReplacementMethod::Mean));
        assert_eq!(" median ".parse::<ReplacementMethod>().ok(), Some(ReplacementMethod::Median));
        assert!(matches!(
            "mode".parse::<ReplacementMethod>(),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    // --- zero_negatives -----------------------------------------------------

    #[test]
    fn test_zero_negatives_only_touches_negative_numbers() {
        let table = DatasetTable::new(
            minutes(3),
            vec![
                Column::from_f64("DHI", &[-3.0, 0.0, 7.0]),
                Column::numeric("DNI", vec![None, Some(-0.5), Some(2.0)]),
                Column::text("Comments", vec![Some("-1".to_string()), None, None]),
            ],
        )
        .expect("valid table");

        let zeroed = zero_negatives(&table);
        assert_eq!(values_of(&zeroed, "DHI"), &[Some(0.0), Some(0.0), Some(7.0)]);
        assert_eq!(values_of(&zeroed, "DNI"), &[None, Some(0.0), Some(2.0)]);
        assert_eq!(zeroed.column("Comments"), table.column("Comments"));
    }
}
