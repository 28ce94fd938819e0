/// Missing-value census.

use serde::Serialize;
use tracing::debug;

use crate::logging::Component;
use crate::model::DatasetTable;

/// Missing cells in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Columns with at least one missing value, in table column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct QualityReport {
    entries: Vec<MissingCount>,
}

impl QualityReport {
    pub fn entries(&self) -> &[MissingCount] {
        &self.entries
    }

    pub fn get(&self, column: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.column == column).map(|e| e.missing)
    }

    pub fn total_missing(&self) -> usize {
        self.entries.iter().map(|e| e.missing).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts missing values per column, keeping only non-zero counts.
pub fn compute_null_report(table: &DatasetTable) -> QualityReport {
    let entries: Vec<MissingCount> = table
        .columns()
        .iter()
        .map(|c| MissingCount { column: c.name.clone(), missing: c.values.missing_count() })
        .filter(|e| e.missing > 0)
        .collect();

    debug!(
        component = %Component::Quality,
        rows = table.row_count(),
        columns_with_nulls = entries.len(),
        "null census complete"
    );

    QualityReport { entries }
}
