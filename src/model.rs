/// DatasetTable, ColumnValues, CellValue, AnalysisError
/// core data structures and error handling
///
/// Core data types for the solar farm analysis engine.
///
/// This module defines the shared table model imported by all other modules.
/// It contains no analysis logic and no I/O, only types and the shape
/// invariants every table must satisfy.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Cell and column types
// ---------------------------------------------------------------------------

/// A single cell read out of a table, used where heterogeneous row values
/// are reported back to a caller (e.g. the nighttime anomaly report).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Missing,
}

/// The values of one column. `None` is the missing marker in every variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    /// Sensor readings and anything else that parsed as a number.
    Numeric(Vec<Option<f64>>),
    /// Free text / categorical values (e.g. a `Comments` column).
    Text(Vec<Option<String>>),
    /// Boolean indicators produced by the engine (e.g. outlier flags).
    Flag(Vec<Option<bool>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Flag(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnValues::Numeric(_))
    }

    /// Returns the numeric values, or `None` for text/flag columns.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Number of missing cells. A numeric NaN counts as missing, matching
    /// how NaN-backed tables report nulls.
    pub fn missing_count(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v
                .iter()
                .filter(|x| x.is_none_or(|x| x.is_nan()))
                .count(),
            ColumnValues::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Flag(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Reads one cell. Out-of-range rows read as missing.
    pub fn cell(&self, row: usize) -> CellValue {
        match self {
            ColumnValues::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => CellValue::Number(x),
                None => CellValue::Missing,
            },
            ColumnValues::Text(v) => match v.get(row).cloned().flatten() {
                Some(s) => CellValue::Text(s),
                None => CellValue::Missing,
            },
            ColumnValues::Flag(v) => match v.get(row).copied().flatten() {
                Some(b) => CellValue::Flag(b),
                None => CellValue::Missing,
            },
        }
    }

    /// Returns a copy with rows reordered according to `order`.
    pub(crate) fn reordered(&self, order: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Numeric(v) => ColumnValues::Numeric(order.iter().map(|&i| v[i]).collect()),
            ColumnValues::Text(v) => ColumnValues::Text(order.iter().map(|&i| v[i].clone()).collect()),
            ColumnValues::Flag(v) => ColumnValues::Flag(order.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(flatten)]
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column { name: name.into(), values: ColumnValues::Numeric(values) }
    }

    /// Convenience constructor for fully-populated numeric columns.
    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Column::numeric(name, values.iter().copied().map(Some).collect())
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column { name: name.into(), values: ColumnValues::Text(values) }
    }

    pub fn flag(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Column { name: name.into(), values: ColumnValues::Flag(values) }
    }
}

// ---------------------------------------------------------------------------
// DatasetTable
// ---------------------------------------------------------------------------

/// Canonical in-memory table: rows keyed by timestamp, named columns.
///
/// Invariants (checked on construction):
///   - every column holds exactly one value per timestamp
///   - column names are unique
///
/// Timestamps are expected in ascending order but are not required to be
/// unique or regularly spaced. The engine never mutates a table it was
/// handed; every operation returns a new one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DatasetTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl DatasetTable {
    pub fn new(timestamps: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self> {
        let mut table = DatasetTable { timestamps, columns: Vec::with_capacity(columns.len()) };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        DatasetTable::default()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.values.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Looks up a column that a numeric-only operation was asked to use.
    ///
    /// Fails with `InvalidArgument` when the column does not exist or holds
    /// non-numeric values.
    pub fn numeric_column(&self, name: &str) -> Result<&[Option<f64>]> {
        let column = self
            .column(name)
            .ok_or_else(|| AnalysisError::InvalidArgument(format!("column not found: {}", name)))?;
        column.values.as_numeric().ok_or_else(|| {
            AnalysisError::InvalidArgument(format!("column is not numeric: {}", name))
        })
    }

    /// Reads every cell of one row, paired with its column name.
    pub fn row(&self, row: usize) -> Vec<(String, CellValue)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.values.cell(row)))
            .collect()
    }

    /// Appends a column, enforcing the shape and uniqueness invariants.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.timestamps.len() {
            return Err(AnalysisError::InvalidArgument(format!(
                "column {} has {} values but the table has {} rows",
                column.name,
                column.values.len(),
                self.timestamps.len()
            )));
        }
        if self.column(&column.name).is_some() {
            return Err(AnalysisError::InvalidArgument(format!(
                "duplicate column name: {}",
                column.name
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replaces the column with the same name, or appends it when no such
    /// column exists. Only the row count is enforced.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.timestamps.len() {
            return Err(AnalysisError::InvalidArgument(format!(
                "column {} has {} values but the table has {} rows",
                column.name,
                column.values.len(),
                self.timestamps.len()
            )));
        }
        match self.column_index(&column.name) {
            Some(i) => self.columns[i] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Returns a copy with every column rewritten by `f`. The closure sees
    /// each column and returns its replacement values; lengths must match.
    pub(crate) fn map_columns<F>(&self, mut f: F) -> DatasetTable
    where
        F: FnMut(&Column) -> ColumnValues,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = f(c);
                debug_assert_eq!(values.len(), c.values.len());
                Column { name: c.name.clone(), values }
            })
            .collect();
        DatasetTable { timestamps: self.timestamps.clone(), columns }
    }

    /// Returns a copy with rows stably sorted by timestamp.
    pub fn sorted_by_time(&self) -> DatasetTable {
        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);
        DatasetTable {
            timestamps: order.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column { name: c.name.clone(), values: c.values.reordered(&order) })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the engine and its ingestion/config collaborators.
///
/// Degenerate statistics (zero variance) and empty inputs are not errors:
/// they resolve to NaN sentinels and empty outputs respectively.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unsupported method name, non-positive bucket size, unknown or
    /// non-numeric column, or an out-of-range parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A cell or timestamp in an input file could not be interpreted.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
