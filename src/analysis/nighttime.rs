/// Negative-reading nighttime cross-check.
///
/// Irradiance sensors commonly drift slightly below zero after sunset, so a
/// negative reading at night is usually a calibration offset while one
/// during the day points at a faulty sensor. This module finds every row
/// with a negative value and records whether it fell inside the night
/// window. It reports per row; it never reduces the rows to one verdict.
///
/// # Clock injection
/// Hours come from each row's own timestamp, never from the wall clock, so
/// results are deterministic.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::logging::Component;
use crate::model::{AnalysisError, CellValue, ColumnValues, DatasetTable, Result};

pub const DEFAULT_NIGHT_START: u32 = 18;
pub const DEFAULT_NIGHT_END: u32 = 6;

// ---------------------------------------------------------------------------
// Night window
// ---------------------------------------------------------------------------

/// Half-open hour-of-day window `[start_hour, end_hour)`.
///
/// When `start_hour > end_hour` the window wraps past midnight
/// (18 → 6 covers 18:00..23:59 and 00:00..05:59). Equal hours describe an
/// empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NightWindow {
    start_hour: u32,
    end_hour: u32,
}

impl NightWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self> {
        if start_hour > 23 || end_hour > 23 {
            return Err(AnalysisError::InvalidArgument(format!(
                "night window hours must be within 0..=23, got {}..{}",
                start_hour, end_hour
            )));
        }
        Ok(NightWindow { start_hour, end_hour })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

impl Default for NightWindow {
    fn default() -> Self {
        NightWindow { start_hour: DEFAULT_NIGHT_START, end_hour: DEFAULT_NIGHT_END }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One row that contained at least one negative value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeReading {
    pub row: usize,
    pub timestamp: NaiveDateTime,
    pub hour: u32,
    pub is_nighttime: bool,
    /// Numeric columns whose value was below zero.
    pub negative_columns: Vec<String>,
    /// Every cell of the row, unmodified, in column order.
    pub values: Vec<(String, CellValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NighttimeAnomalyReport {
    pub window: NightWindow,
    pub records: Vec<NegativeReading>,
}

impl NighttimeAnomalyReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn nighttime_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_nighttime).count()
    }

    pub fn daytime_count(&self) -> usize {
        self.len() - self.nighttime_count()
    }

    /// Negative readings outside the night window, the suspicious ones.
    pub fn daytime_records(&self) -> impl Iterator<Item = &NegativeReading> {
        self.records.iter().filter(|r| !r.is_nighttime)
    }
}

/// Finds rows with any negative numeric value and tags each with its
/// hour-of-day and whether that hour falls in `window`.
pub fn check_negative_nighttime(table: &DatasetTable, window: NightWindow) -> NighttimeAnomalyReport {
    let numeric: Vec<(&str, &[Option<f64>])> = table
        .columns()
        .iter()
        .filter_map(|c| match &c.values {
            ColumnValues::Numeric(v) => Some((c.name.as_str(), v.as_slice())),
            _ => None,
        })
        .collect();

    let mut records = Vec::new();
    for (row, timestamp) in table.timestamps().iter().enumerate() {
        let negative_columns: Vec<String> = numeric
            .iter()
            .filter(|(_, values)| values[row].is_some_and(|x| x < 0.0))
            .map(|(name, _)| name.to_string())
            .collect();
        if negative_columns.is_empty() {
            continue;
        }

        let hour = timestamp.hour();
        records.push(NegativeReading {
            row,
            timestamp: *timestamp,
            hour,
            is_nighttime: window.contains(hour),
            negative_columns,
            values: table.row(row),
        });
    }

    let report = NighttimeAnomalyReport { window, records };
    debug!(
        component = %Component::Nighttime,
        negative_rows = report.len(),
        nighttime = report.nighttime_count(),
        daytime = report.daytime_count(),
        "negative value check complete"
    );
    report
}
