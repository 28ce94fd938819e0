/// Descriptive statistics per numeric column: count, mean, std, min,
/// quartiles and max.

use serde::Serialize;
use tracing::debug;

use crate::analysis::stats::{observed, quantile_sorted, sorted_copy, ColumnMoments};
use crate::logging::Component;
use crate::model::{ColumnValues, DatasetTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarizes every numeric column, in table order. Columns without any
/// observation report a zero count and NaN statistics.
pub fn describe(table: &DatasetTable) -> Vec<ColumnSummary> {
    let summaries: Vec<ColumnSummary> = table
        .columns()
        .iter()
        .filter_map(|c| match &c.values {
            ColumnValues::Numeric(values) => Some(summarize(&c.name, values)),
            _ => None,
        })
        .collect();

    debug!(component = %Component::Summary, columns = summaries.len(), "describe complete");
    summaries
}

fn summarize(name: &str, values: &[Option<f64>]) -> ColumnSummary {
    let moments = ColumnMoments::of(values);
    let sorted = sorted_copy(&observed(values));
    let q = |p: f64| quantile_sorted(&sorted, p).unwrap_or(f64::NAN);

    ColumnSummary {
        column: name.to_string(),
        count: moments.count,
        mean: moments.mean,
        std: moments.std_dev,
        min: q(0.0),
        q25: q(0.25),
        median: q(0.5),
        q75: q(0.75),
        max: q(1.0),
    }
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

    #[test]
    fn test_describe_matches_hand_computed_values() {
        let table = DatasetTable::new(
            minutes(5),
            vec![
                Column::numeric("GHI", vec![Some(4.0), Some(1.0), None, Some(3.0), Some(2.0)]),
                Column::text("Comments", vec![None; 5]),
            ],
        )
        .expect("valid table");

        let summary = describe(&table);
        assert_eq!(summary.len(), 1, "text columns are skipped");
        let ghi = &summary[0];
        assert_eq!(ghi.count, 4);
        assert_eq!(ghi.mean, 2.5);
        assert_eq!(ghi.min, 1.0);
        assert_eq!(ghi.q25, 1.75);
        assert_eq!(ghi.median, 2.5);
        assert_eq!(ghi.q75, 3.25);
        assert_eq!(ghi.max, 4.0);
        assert!((ghi.std - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn test_all_missing_column_reports_zero_count() {
        let table = DatasetTable::new(minutes(2), vec![Column::numeric("RH", vec![None, None])])
            .expect("valid table");
        let summary = describe(&table);
        assert_eq!(summary[0].count, 0);
        assert!(summary[0].mean.is_nan());
        assert!(summary[0].max.is_nan());
    }
}
