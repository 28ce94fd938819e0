/// Analysis and cleaning engine for solar sensor tables.
///
/// Every operation takes a `&DatasetTable` plus explicit configuration and
/// returns a new structure. Nothing in here performs I/O or keeps state
/// between calls.
///
/// Submodules:
/// - `stats`: mean / sample std / median / quantile shared by everything below.
/// - `quality`: missing-value census.
/// - `outliers`: z-score computation and flagging.
/// - `remediation`: clipping, outlier replacement, negative zeroing.
/// - `nighttime`: negative readings cross-checked against time of day.
/// - `aggregation`: fixed-width and calendar resampling.
/// - `correlation`: Pearson matrix and scatter point lists.
/// - `summary`: descriptive statistics.
pub mod analysis;
pub mod config;
/// Ingestion collaborators that produce `DatasetTable`s.
///
/// Submodules:
/// - `csv`: headered CSV station exports.
pub mod ingest;
pub mod logging;
pub mod model;
/// One-shot diagnostics over a station table.
pub mod report;
pub mod sensors;

pub use analysis::aggregation::{
    aggregate_by_calendar_period, resample, AggregatedSeries, AggregationMethod, Bucketing,
    Frequency,
};
pub use analysis::correlation::{correlation_matrix, scatter_series, CorrelationMatrix, ScatterSeries};
pub use analysis::nighttime::{check_negative_nighttime, NightWindow, NighttimeAnomalyReport};
pub use analysis::outliers::{compute_z_scores, ZScoreResult, DEFAULT_Z_THRESHOLD};
pub use analysis::quality::{compute_null_report, QualityReport};
pub use analysis::remediation::{clip, replace_outliers, zero_negatives, RangeSpec, ReplacementMethod};
pub use analysis::summary::{describe, ColumnSummary};
pub use config::AnalysisConfig;
pub use model::{AnalysisError, CellValue, Column, ColumnValues, DatasetTable, Result};
