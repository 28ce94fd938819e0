/// Period resampling.
///
/// Two bucketing schemes are supported:
///   - fixed-width windows of N days anchored at the table's first timestamp
///   - calendar days, weeks (Monday to Sunday), months and years, labelled
///     by the first instant of the period
///
/// Every bucket between the first and last reading is emitted, empty ones
/// with missing values, so the output is a regular series. Aggregation
/// functions come from a closed enum; method names are validated when they
/// are parsed.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::stats::{mean, median};
use crate::logging::Component;
use crate::model::{AnalysisError, Column, DatasetTable, Result};

// ---------------------------------------------------------------------------
// Methods and frequencies
// ---------------------------------------------------------------------------

/// Aggregation function applied per column within each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AggregationMethod {
    #[default]
    Mean,
    Median,
    Min,
    Max,
}

impl AggregationMethod {
    /// Applies the function to observed values. `None` for an empty bucket.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            AggregationMethod::Mean => mean(values),
            AggregationMethod::Median => median(values),
            AggregationMethod::Min => values.iter().copied().reduce(f64::min),
            AggregationMethod::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

impl FromStr for AggregationMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(AggregationMethod::Mean),
            "median" => Ok(AggregationMethod::Median),
            "min" => Ok(AggregationMethod::Min),
            "max" => Ok(AggregationMethod::Max),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unsupported aggregation method: {} (expected mean, median, min or max)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for AggregationMethod {
    type Error = AnalysisError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMethod::Mean => write!(f, "mean"),
            AggregationMethod::Median => write!(f, "median"),
            AggregationMethod::Min => write!(f, "min"),
            AggregationMethod::Max => write!(f, "max"),
        }
    }
}

/// Named resampling periods, as offered to users.
///
/// Accepts full names ("Weekly") or single-letter codes ("W").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn bucketing(&self) -> Bucketing {
        match self {
            Frequency::Daily => Bucketing::CalendarDay,
            Frequency::Weekly => Bucketing::CalendarWeek,
            Frequency::Monthly => Bucketing::CalendarMonth,
            Frequency::Yearly => Bucketing::CalendarYear,
        }
    }
}

impl FromStr for Frequency {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "daily" | "day" => Ok(Frequency::Daily),
            "w" | "weekly" | "week" => Ok(Frequency::Weekly),
            "m" | "monthly" | "month" => Ok(Frequency::Monthly),
            "y" | "yearly" | "year" | "annual" => Ok(Frequency::Yearly),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unsupported frequency: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = AnalysisError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// How rows were assigned to buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucketing {
    FixedDays(u32),
    CalendarDay,
    /// Monday 00:00 through Sunday 23:59:59.
    CalendarWeek,
    CalendarMonth,
    CalendarYear,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A resampled table: one row per bucket, one column per aggregated
/// source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub method: AggregationMethod,
    pub bucketing: Bucketing,
    pub bucket_starts: Vec<NaiveDateTime>,
    pub columns: Vec<AggregatedColumn>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.bucket_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket_starts.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// The series as a table indexed by bucket start.
    pub fn to_table(&self) -> Result<DatasetTable> {
        DatasetTable::new(
            self.bucket_starts.clone(),
            self.columns
                .iter()
                .map(|c| Column::numeric(c.name.clone(), c.values.clone()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Resamples every numeric column into `bucket_days`-day windows anchored
/// at the first timestamp.
///
/// Fails with `InvalidArgument` when `bucket_days` is zero.
pub fn resample(
    table: &DatasetTable,
    bucket_days: u32,
    method: AggregationMethod,
) -> Result<AggregatedSeries> {
    if bucket_days == 0 {
        return Err(AnalysisError::InvalidArgument(
            "bucket size must be a positive number of days".to_string(),
        ));
    }
    let columns = table.numeric_column_names();
    aggregate(table, &columns, Bucketing::FixedDays(bucket_days), method)
}

/// Resamples the selected columns to calendar month or year boundaries
/// using the mean.
///
/// Fails with `InvalidArgument` for Daily/Weekly and for unknown or
/// non-numeric columns.
pub fn aggregate_by_calendar_period<S: AsRef<str>>(
    table: &DatasetTable,
    columns: &[S],
    frequency: Frequency,
) -> Result<AggregatedSeries> {
    let bucketing = match frequency {
        Frequency::Monthly | Frequency::Yearly => frequency.bucketing(),
        other => {
            return Err(AnalysisError::InvalidArgument(format!(
                "calendar aggregation supports Monthly or Yearly, got {:?}",
                other
            )));
        }
    };
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    aggregate(table, &names, bucketing, AggregationMethod::Mean)
}

/// Resamples selected columns at a named frequency. Used by the scatter
/// view, which accepts any frequency.
pub(crate) fn resample_at_frequency(
    table: &DatasetTable,
    columns: &[&str],
    frequency: Frequency,
    method: AggregationMethod,
) -> Result<AggregatedSeries> {
    aggregate(table, columns, frequency.bucketing(), method)
}

// ---------------------------------------------------------------------------
// Bucketing internals
// ---------------------------------------------------------------------------

fn aggregate(
    table: &DatasetTable,
    columns: &[&str],
    bucketing: Bucketing,
    method: AggregationMethod,
) -> Result<AggregatedSeries> {
    let sources = columns
        .iter()
        .map(|&name| table.numeric_column(name).map(|v| (name, v)))
        .collect::<Result<Vec<_>>>()?;

    let keys: Vec<i64> = match (bucketing, table.timestamps().first()) {
        (_, None) => Vec::new(),
        (Bucketing::FixedDays(days), Some(&anchor)) => {
            let width_ms = Duration::days(days as i64).num_milliseconds();
            table
                .timestamps()
                .iter()
                .map(|t| (*t - anchor).num_milliseconds().div_euclid(width_ms))
                .collect()
        }
        (Bucketing::CalendarDay, Some(_)) => table
            .timestamps()
            .iter()
            .map(|t| t.num_days_from_ce() as i64)
            .collect(),
        (Bucketing::CalendarWeek, Some(_)) => table
            .timestamps()
            .iter()
            .map(|t| (t.num_days_from_ce() as i64 - 1).div_euclid(7))
            .collect(),
        (Bucketing::CalendarMonth, Some(_)) => table
            .timestamps()
            .iter()
            .map(|t| t.year() as i64 * 12 + t.month0() as i64)
            .collect(),
        (Bucketing::CalendarYear, Some(_)) => {
            table.timestamps().iter().map(|t| t.year() as i64).collect()
        }
    };

    let (first_key, members) = group_rows(&keys);
    let bucket_starts = (0..members.len())
        .map(|offset| bucket_start(table, bucketing, first_key + offset as i64))
        .collect::<Result<Vec<_>>>()?;

    let columns = sources
        .iter()
        .map(|(name, values)| AggregatedColumn {
            name: name.to_string(),
            values: members
                .iter()
                .map(|rows| {
                    let observed: Vec<f64> = rows
                        .iter()
                        .filter_map(|&r| values[r])
                        .filter(|x| !x.is_nan())
                        .collect();
                    method.apply(&observed)
                })
                .collect(),
        })
        .collect();

    debug!(
        component = %Component::Aggregation,
        ?bucketing,
        %method,
        rows = table.row_count(),
        buckets = bucket_starts.len(),
        "resampled"
    );

    Ok(AggregatedSeries { method, bucketing, bucket_starts, columns })
}

/// Groups row indices by bucket key. Returns the smallest key and one row
/// list per key from smallest to largest, including empty buckets.
fn group_rows(keys: &[i64]) -> (i64, Vec<Vec<usize>>) {
    let (Some(&min), Some(&max)) = (keys.iter().min(), keys.iter().max()) else {
        return (0, Vec::new());
    };
    let mut members = vec![Vec::new(); (max - min + 1) as usize];
    for (row, key) in keys.iter().enumerate() {
        members[(key - min) as usize].push(row);
    }
    (min, members)
}

fn bucket_start(table: &DatasetTable, bucketing: Bucketing, key: i64) -> Result<NaiveDateTime> {
    let start = match bucketing {
        Bucketing::FixedDays(days) => table
            .timestamps()
            .first()
            .map(|&anchor| anchor + Duration::days(days as i64 * key)),
        Bucketing::CalendarDay => i32::try_from(key)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        // Day 1 of the common era is a Monday.
        Bucketing::CalendarWeek => i32::try_from(key * 7 + 1)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        Bucketing::CalendarMonth => {
            let year = key.div_euclid(12) as i32;
            let month = key.rem_euclid(12) as u32 + 1;
            NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Bucketing::CalendarYear => {
            NaiveDate::from_ymd_opt(key as i32, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    };
    start.ok_or_else(|| {
        AnalysisError::InvalidArgument(format!("bucket {} is outside the supported date range", key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .expect("valid timestamp")
    }

    fn daily_table() -> DatasetTable {
        DatasetTable::new(
            vec![dt(2021, 8, 1, 6), dt(2021, 8, 1, 18), dt(2021, 8, 2, 6), dt(2021, 8, 4, 6)],
            vec![
                Column::numeric("GHI", vec![Some(1.0), Some(3.0), Some(10.0), None]),
                Column::text("Comments", vec![None, None, None, None]),
            ],
        )
        .expect("valid table")
    }

    #[test]
    fn test_resample_one_day_buckets_anchor_at_first_timestamp() {
        let series = resample(&daily_table(), 1, AggregationMethod::Mean).expect("valid bucket");
        assert_eq!(
            series.bucket_starts,
            vec![dt(2021, 8, 1, 6), dt(2021, 8, 2, 6), dt(2021, 8, 3, 6), dt(2021, 8, 4, 6)]
        );
        assert_eq!(series.column("GHI"), Some(&[Some(2.0), Some(10.0), None, None][..]));
        assert!(series.column("Comments").is_none(), "text columns are not aggregated");
    }

    #[test]
    fn test_resample_methods() {
        let table = daily_table();
        let max = resample(&table, 2, AggregationMethod::Max).expect("valid bucket");
        assert_eq!(max.column("GHI"), Some(&[Some(10.0), None][..]));
        let min = resample(&table, 2, AggregationMethod::Min).expect("valid bucket");
        assert_eq!(min.column("GHI"), Some(&[Some(1.0), None][..]));
        let median = resample(&table, 2, AggregationMethod::Median).expect("valid bucket");
        assert_eq!(median.column("GHI"), Some(&[Some(3.0), None][..]));
    }

    #[test]
    fn test_zero_bucket_days_is_rejected() {
        assert!(matches!(
            resample(&daily_table(), 0, AggregationMethod::Mean),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_method_names_parse_case_insensitively() {
        assert_eq!("Median".parse::<AggregationMethod>().ok(), Some(AggregationMethod::Median));
        assert_eq!("MAX".parse::<AggregationMethod>().ok(), Some(AggregationMethod::Max));
        assert!(matches!(
            "sum".parse::<AggregationMethod>(),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_calendar_months_fill_gaps_and_start_on_the_first() {
        let table = DatasetTable::new(
            vec![dt(2021, 11, 15, 12), dt(2021, 11, 30, 12), dt(2022, 1, 2, 0)],
            vec![Column::from_f64("Tamb", &[20.0, 30.0, 10.0])],
        )
        .expect("valid table");

        let series = aggregate_by_calendar_period(&table, &["Tamb"], Frequency::Monthly)
            .expect("monthly is supported");
        assert_eq!(
            series.bucket_starts,
            vec![dt(2021, 11, 1, 0), dt(2021, 12, 1, 0), dt(2022, 1, 1, 0)]
        );
        assert_eq!(series.column("Tamb"), Some(&[Some(25.0), None, Some(10.0)][..]));
        assert_eq!(series.method, AggregationMethod::Mean);
    }

    #[test]
    fn test_calendar_years() {
        let table = DatasetTable::new(
            vec![dt(2021, 3, 1, 0), dt(2022, 7, 1, 0), dt(2022, 9, 1, 0)],
            vec![Column::from_f64("RH", &[40.0, 60.0, 80.0])],
        )
        .expect("valid table");
        let series = aggregate_by_calendar_period(&table, &["RH"], Frequency::Yearly)
            .expect("yearly is supported");
        assert_eq!(series.bucket_starts, vec![dt(2021, 1, 1, 0), dt(2022, 1, 1, 0)]);
        assert_eq!(series.column("RH"), Some(&[Some(40.0), Some(70.0)][..]));
    }

    #[test]
    fn test_calendar_aggregation_rejects_fixed_frequencies_and_text_columns() {
        let table = daily_table();
        assert!(matches!(
            aggregate_by_calendar_period(&table, &["GHI"], Frequency::Weekly),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            aggregate_by_calendar_period(&table, &["Comments"], Frequency::Monthly),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_daily_frequency_splits_on_midnight_not_first_reading() {
        let table = DatasetTable::new(
            vec![dt(2021, 8, 1, 12), dt(2021, 8, 1, 23), dt(2021, 8, 2, 1)],
            vec![Column::from_f64("GHI", &[1.0, 3.0, 10.0])],
        )
        .expect("valid table");

        let series = resample_at_frequency(&table, &["GHI"], Frequency::Daily, AggregationMethod::Mean)
            .expect("numeric column");
        assert_eq!(series.bucketing, Bucketing::CalendarDay);
        assert_eq!(series.bucket_starts, vec![dt(2021, 8, 1, 0), dt(2021, 8, 2, 0)]);
        assert_eq!(series.column("GHI"), Some(&[Some(2.0), Some(10.0)][..]));
    }

    #[test]
    fn test_weekly_frequency_uses_monday_to_sunday_weeks() {
        // 2021-08-01 is a Sunday, 2021-08-02 a Monday.
        let table = DatasetTable::new(
            vec![dt(2021, 8, 1, 12), dt(2021, 8, 2, 0), dt(2021, 8, 8, 23), dt(2021, 8, 9, 0)],
            vec![Column::from_f64("Tamb", &[10.0, 20.0, 30.0, 40.0])],
        )
        .expect("valid table");

        let series =
            resample_at_frequency(&table, &["Tamb"], Frequency::Weekly, AggregationMethod::Mean)
                .expect("numeric column");
        assert_eq!(
            series.bucket_starts,
            vec![dt(2021, 7, 26, 0), dt(2021, 8, 2, 0), dt(2021, 8, 9, 0)]
        );
        assert_eq!(series.column("Tamb"), Some(&[Some(10.0), Some(25.0), Some(40.0)][..]));
    }

    #[test]
    fn test_frequency_codes() {
        assert_eq!("W".parse::<Frequency>().ok(), Some(Frequency::Weekly));
        assert_eq!("Monthly".parse::<Frequency>().ok(), Some(Frequency::Monthly));
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_empty_table_gives_empty_series() {
        let table = DatasetTable::new(Vec::new(), vec![Column::numeric("GHI", Vec::new())])
            .expect("valid table");
        let series = resample(&table, 1, AggregationMethod::Mean).expect("valid bucket");
        assert!(series.is_empty());
        assert_eq!(series.column("GHI"), Some(&[][..]));
    }

    #[test]
    fn test_to_table_round_trips_bucket_index() {
        let series = resample(&daily_table(), 1, AggregationMethod::Mean).expect("valid bucket");
        let table = series.to_table().expect("consistent shape");
        assert_eq!(table.timestamps(), series.bucket_starts.as_slice());
        assert_eq!(table.column_names(), vec!["GHI"]);
    }
}
