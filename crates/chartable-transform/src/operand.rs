//! Operand coercion shared by every transform.

use chartable_model::{CellValue, ColumnStore, ErrorValue, Result, TableError};

/// A numeric operand, or the sentinel cell to emit in its place.
pub(crate) fn numeric(cell: &CellValue) -> std::result::Result<f64, CellValue> {
    match cell {
        CellValue::Number(n) if n.is_nan() => Err(ErrorValue::NaNButShouldBeNumber.into()),
        CellValue::Number(n) => Ok(*n),
        CellValue::Error(_) => Err(cell.clone()),
        CellValue::Null => Err(ErrorValue::NullButShouldBeNumber.into()),
        CellValue::Text(s) if s.is_empty() => Err(ErrorValue::BlankButShouldBeNumber.into()),
        CellValue::Text(_) => Err(ErrorValue::NotParseableAsNumber.into()),
        CellValue::Bool(_) => Err(ErrorValue::TypeMismatch.into()),
    }
}

/// `cell` as a number cell, or the sentinel it resolves to.
pub(crate) fn normalized(cell: &CellValue) -> CellValue {
    match numeric(cell) {
        Ok(n) => CellValue::Number(n),
        Err(sentinel) => sentinel,
    }
}

pub(crate) fn column<'a>(store: &'a ColumnStore, slug: &str) -> Result<&'a [CellValue]> {
    store.get(slug).map(Vec::as_slice).ok_or_else(|| {
        tracing::warn!(slug, "transform references a missing column");
        TableError::missing_column(slug)
    })
}

/// Check that every column has `expected` cells.
pub(crate) fn check_lengths(columns: &[(&str, &[CellValue])]) -> Result<usize> {
    let expected = columns.first().map_or(0, |(_, values)| values.len());
    for (slug, values) in columns {
        if values.len() != expected {
            return Err(TableError::ColumnLengthMismatch {
                slug: (*slug).to_string(),
                expected,
                actual: values.len(),
            });
        }
    }
    Ok(expected)
}

/// Contiguous row ranges sharing one entity value.
pub(crate) fn entity_runs(entities: &[CellValue]) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for index in 1..=entities.len() {
        if index == entities.len() || entities[index] != entities[start] {
            runs.push(start..index);
            start = index;
        }
    }
    runs
}
