//! Provenance of a table: the step that produced it from its parent.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Category of a transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransformKind {
    LoadFromDelimited,
    LoadFromRows,
    LoadFromColumnStore,
    LoadFromMatrix,
    LoadFromDataFrame,
    FilterRows,
    FilterColumns,
    AppendRows,
    AppendColumns,
    RenameColumns,
    SortRows,
    SortColumns,
    UpdateRows,
    UpdateDefs,
    Transpose,
    Concat,
    InterpolateColumn,
}

impl TransformKind {
    /// True for steps that create a root table.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            TransformKind::LoadFromDelimited
                | TransformKind::LoadFromRows
                | TransformKind::LoadFromColumnStore
                | TransformKind::LoadFromMatrix
                | TransformKind::LoadFromDataFrame
        )
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One entry in a table's provenance chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStep {
    pub kind: TransformKind,
    pub description: String,
    /// Time spent building this table from its parent.
    pub elapsed: Duration,
    pub num_rows: usize,
    pub num_columns: usize,
}

impl TableStep {
    /// One-line rendering without timing, stable across runs.
    pub fn short_line(&self, index: usize) -> String {
        let mut line = format!(
            "{index}. {} ({} rows, {} columns)",
            self.kind, self.num_rows, self.num_columns
        );
        if !self.description.is_empty() {
            line.push_str(": ");
            line.push_str(&self.description);
        }
        line
    }

    pub fn line(&self, index: usize) -> String {
        format!("{} [{:.3}ms]", self.short_line(index), self.elapsed.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_line() {
        let step = TableStep {
            kind: TransformKind::FilterRows,
            description: "keep France".to_string(),
            elapsed: Duration::from_millis(2),
            num_rows: 3,
            num_columns: 2,
        };
        assert_eq!(step.short_line(1), "1. FilterRows (3 rows, 2 columns): keep France");
        assert_eq!(step.line(1), "1. FilterRows (3 rows, 2 columns): keep France [2.000ms]");
        assert!(TransformKind::LoadFromRows.is_load());
        assert!(!step.kind.is_load());
    }
}
