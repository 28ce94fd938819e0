/// Diagnostics Report Module
///
/// Runs the full set of data-quality checks over one table and collects the
/// results into a single serializable report. Use this to get a first look
/// at a new station export before deciding how to clean it.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::analysis::aggregation::{resample, AggregatedSeries};
use crate::analysis::correlation::{correlation_matrix, scatter_series, CorrelationMatrix, ScatterSeries};
use crate::analysis::nighttime::check_negative_nighttime;
use crate::analysis::outliers::compute_z_scores;
use crate::analysis::quality::{compute_null_report, QualityReport};
use crate::analysis::summary::{describe, ColumnSummary};
use crate::config::AnalysisConfig;
use crate::logging::{log_operation_summary, Component};
use crate::model::{DatasetTable, Result};
use crate::sensors::irradiance_columns;

// ============================================================================
// Report structures
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub dataset: String,
    pub generated_at: String,
    pub rows: usize,
    pub columns: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub missing: QualityReport,
    pub outliers: OutlierOverview,
    pub negatives: NegativeOverview,
    pub summary: Vec<ColumnSummary>,
    /// Every numeric column at `[aggregation]` bucket size and method.
    pub resampled: AggregatedSeries,
    /// Present when at least two columns were selected for correlation.
    pub correlation: Option<CorrelationMatrix>,
    /// Column pairs resampled at `[correlation] frequency`. Empty when
    /// fewer than two columns were selected.
    pub scatter: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierOverview {
    pub threshold: f64,
    pub columns: Vec<ColumnOutliers>,
    /// Rows flagged in at least one column.
    pub flagged_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub mean: f64,
    pub std_dev: f64,
    pub flagged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NegativeOverview {
    pub night_start: u32,
    pub night_end: u32,
    pub rows_with_negatives: usize,
    pub nighttime: usize,
    pub daytime: usize,
}

// ============================================================================
// Runner
// ============================================================================

/// Columns to correlate: the configured list, or the irradiance sensors
/// present in the table (plus `Tamb` when available).
fn correlation_columns<'a>(table: &'a DatasetTable, config: &'a AnalysisConfig) -> Vec<&'a str> {
    if !config.correlation.columns.is_empty() {
        return config.correlation.columns.iter().map(String::as_str).collect();
    }
    let numeric = table.numeric_column_names();
    irradiance_columns()
        .into_iter()
        .chain(["Tamb"])
        .filter(|c| numeric.contains(c))
        .collect()
}

pub fn run_diagnostics(
    dataset: &str,
    table: &DatasetTable,
    config: &AnalysisConfig,
) -> Result<DiagnosticsReport> {
    config.validate()?;
    let window = config.night_window()?;
    let numeric = table.numeric_column_names();
    let corr_columns = correlation_columns(table, config);

    info!(
        component = %Component::Report,
        dataset,
        rows = table.row_count(),
        "running diagnostics"
    );

    let missing = compute_null_report(table);

    let scores = compute_z_scores(table, &numeric, config.outliers.threshold)?;
    let flagged_rows = scores.flagged_rows().len();
    log_operation_summary(Component::Outliers, "z-score flags", table.row_count(), flagged_rows);
    let outliers = OutlierOverview {
        threshold: scores.threshold,
        columns: scores
            .scores
            .iter()
            .map(|s| ColumnOutliers {
                column: s.column.clone(),
                mean: s.moments.mean,
                std_dev: s.moments.std_dev,
                flagged: s.flagged_count(),
            })
            .collect(),
        flagged_rows,
    };

    let night = check_negative_nighttime(table, window);
    let negatives = NegativeOverview {
        night_start: window.start_hour(),
        night_end: window.end_hour(),
        rows_with_negatives: night.len(),
        nighttime: night.nighttime_count(),
        daytime: night.daytime_count(),
    };

    let resampled = resample(table, config.aggregation.bucket_days, config.aggregation.method)?;

    let (correlation, scatter) = if corr_columns.len() >= 2 {
        (
            Some(correlation_matrix(table, &corr_columns)?),
            scatter_series(table, &corr_columns, config.correlation.frequency)?,
        )
    } else {
        (None, Vec::new())
    };

    Ok(DiagnosticsReport {
        dataset: dataset.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        rows: table.row_count(),
        columns: table.column_count(),
        first_timestamp: table.timestamps().first().map(|t| t.to_string()),
        last_timestamp: table.timestamps().last().map(|t| t.to_string()),
        missing,
        outliers,
        negatives,
        summary: describe(table),
        resampled,
        correlation,
        scatter,
    })
}

// ============================================================================
// Text output
// ============================================================================

pub fn render_summary(report: &DiagnosticsReport) -> String {
    let rule = "═".repeat(63);
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("DIAGNOSTICS: {}\n", report.dataset));
    out.push_str(&format!("{}\n\n", rule));

    out.push_str(&format!("Rows:      {}\n", report.rows));
    out.push_str(&format!("Columns:   {}\n", report.columns));
    if let (Some(first), Some(last)) = (&report.first_timestamp, &report.last_timestamp) {
        out.push_str(&format!("Range:     {} → {}\n", first, last));
    }

    out.push_str("\nMissing values:\n");
    if report.missing.is_empty() {
        out.push_str("  none\n");
    }
    for entry in report.missing.entries() {
        out.push_str(&format!("  {:<14} {}\n", entry.column, entry.missing));
    }

    out.push_str(&format!("\nOutliers (|z| > {}):\n", report.outliers.threshold));
    for col in &report.outliers.columns {
        if col.std_dev.is_nan() || col.std_dev == 0.0 {
            out.push_str(&format!("  {:<14} no signal (zero variance)\n", col.column));
        } else {
            out.push_str(&format!(
                "  {:<14} {:>6} flagged  (mean {:.2}, std {:.2})\n",
                col.column, col.flagged, col.mean, col.std_dev
            ));
        }
    }
    out.push_str(&format!("  rows flagged in any column: {}\n", report.outliers.flagged_rows));

    out.push_str(&format!(
        "\nNegative readings (night {:02}:00 → {:02}:00):\n",
        report.negatives.night_start, report.negatives.night_end
    ));
    out.push_str(&format!(
        "  {} rows: {} at night, {} during the day\n",
        report.negatives.rows_with_negatives, report.negatives.nighttime, report.negatives.daytime
    ));

    out.push_str(&format!(
        "\nResampled ({:?}, {}): {} buckets\n",
        report.resampled.bucketing,
        report.resampled.method,
        report.resampled.len()
    ));

    if let Some(matrix) = &report.correlation {
        out.push_str("\nCorrelation:\n");
        out.push_str(&format!("  {:<8}", ""));
        for c in &matrix.columns {
            out.push_str(&format!("{:>8}", c));
        }
        out.push('\n');
        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            out.push_str(&format!("  {:<8}", name));
            for r in row {
                out.push_str(&format!("{:>8.2}", r));
            }
            out.push('\n');
        }
    }

    if !report.scatter.is_empty() {
        out.push_str("\nScatter pairs:\n");
        for pair in &report.scatter {
            out.push_str(&format!(
                "  {} vs {}: {} points\n",
                pair.x_column,
                pair.y_column,
                pair.points.len()
            ));
        }
    }

    out.push_str(&format!("{}\n", rule));
    out
}

pub fn print_summary(report: &DiagnosticsReport) {
    print!("{}", render_summary(report));
}
