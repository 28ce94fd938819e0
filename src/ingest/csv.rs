/// CSV ingestion for solar station exports
///
/// Turns a headered CSV export (one row per reading, a timestamp column
/// plus sensor columns) into a `DatasetTable`. Column types are inferred:
/// a column is numeric when every non-missing cell parses as a number,
/// otherwise it is kept as text. Rows are sorted by timestamp.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, info};

use crate::logging::Component;
use crate::model::{AnalysisError, CellValue, Column, DatasetTable, Result};

/// Layout used when writing tables back out.
const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layouts seen in station exports, tried in order before RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Header of the column holding reading timestamps.
    pub timestamp_column: String,
    /// Cell contents (compared case-insensitively, after trimming) that mean
    /// "no reading". Empty cells are always missing.
    pub missing_markers: Vec<String>,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            timestamp_column: "Timestamp".to_string(),
            missing_markers: ["null", "na", "nan", "n/a"].iter().map(|s| s.to_string()).collect(),
            delimiter: b',',
        }
    }
}

impl CsvOptions {
    fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        cell.is_empty() || self.missing_markers.iter().any(|m| m.eq_ignore_ascii_case(cell))
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load a CSV file from disk.
pub fn load_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<DatasetTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = load_from_reader(file, options)?;
    info!(
        component = %Component::Ingest,
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded dataset"
    );
    Ok(table)
}

/// Load CSV data from any reader (file, upload buffer, test string).
pub fn load_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<DatasetTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let ts_index = headers
        .iter()
        .position(|h| h == options.timestamp_column)
        .ok_or_else(|| {
            AnalysisError::InvalidArgument(format!(
                "timestamp column '{}' not found in header",
                options.timestamp_column
            ))
        })?;

    let value_headers: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_index)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut timestamps = Vec::new();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); value_headers.len()];

    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = i + 2;

        let raw_ts = record.get(ts_index).unwrap_or("");
        timestamps.push(parse_timestamp(raw_ts).ok_or_else(|| AnalysisError::Parse {
            line,
            message: format!("unrecognized timestamp '{}'", raw_ts),
        })?);

        for (slot, (col_index, _)) in cells.iter_mut().zip(&value_headers) {
            let cell = record.get(*col_index).unwrap_or("");
            slot.push(if options.is_missing(cell) { None } else { Some(cell.to_string()) });
        }
    }

    let columns = value_headers
        .into_iter()
        .zip(cells)
        .map(|((_, name), raw)| infer_column(name, raw))
        .collect();

    let table = DatasetTable::new(timestamps, columns)?;
    debug!(
        component = %Component::Ingest,
        rows = table.row_count(),
        numeric_columns = table.numeric_column_names().len(),
        "parsed CSV"
    );
    Ok(table.sorted_by_time())
}

/// Numeric if every present cell parses as `f64`, text otherwise.
fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = raw
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        Some(values) => Column::numeric(name, values),
        None => Column::text(name, raw),
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

// ============================================================================
// Writing
// ============================================================================

/// Write a table to disk as CSV, timestamp first.
pub fn write_csv(table: &DatasetTable, path: impl AsRef<Path>, timestamp_column: &str) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_to_writer(table, file, timestamp_column)?;
    info!(
        component = %Component::Ingest,
        path = %path.display(),
        rows = table.row_count(),
        "wrote dataset"
    );
    Ok(())
}

/// Write a table as CSV to any writer. Missing cells are written empty.
pub fn write_to_writer<W: Write>(table: &DatasetTable, writer: W, timestamp_column: &str) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![timestamp_column.to_string()];
    header.extend(table.column_names().into_iter().map(String::from));
    csv_writer.write_record(&header)?;

    for (row, ts) in table.timestamps().iter().enumerate() {
        let mut record = vec![ts.format(OUTPUT_TIMESTAMP_FORMAT).to_string()];
        record.extend(table.row(row).into_iter().map(|(_, cell)| match cell {
            CellValue::Number(x) => x.to_string(),
            CellValue::Text(s) => s,
            CellValue::Flag(b) => b.to_string(),
            CellValue::Missing => String::new(),
        }));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

// ============================================================================
// Naming
// ============================================================================

/// Display name for an uploaded file: drop the `.csv` extension, turn
/// underscores into spaces and title-case each word.
///
/// "benin-malanville.csv" → "Benin-Malanville", "sierra_leone.csv" →
/// "Sierra Leone".
pub fn dataset_display_name(file_name: &str) -> String {
    let stem = file_name.replace(".csv", "").replace('_', " ");
    let mut out = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
