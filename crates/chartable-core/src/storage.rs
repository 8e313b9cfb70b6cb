//! Row- and column-oriented backing stores.
//!
//! Both engines expose the same read API and build the other representation
//! on first request. The conversion is cached for the life of the store.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use chartable_model::{CellValue, Result, Row, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngine {
    Rows,
    Columns,
}

/// Raw cells behind a table.
pub trait TableStorage: fmt::Debug + Send + Sync {
    fn engine(&self) -> StorageEngine;

    fn num_rows(&self) -> usize;

    /// Slugs present in the stored data, in first-seen order.
    fn slugs(&self) -> &[String];

    /// Raw cell at `row`; `None` when the row has no value for `slug`.
    fn cell(&self, row: usize, slug: &str) -> Option<&CellValue>;

    /// Row view of the stored data.
    fn rows(&self) -> &[Row];

    /// Column view of the stored data. Undefined cells read as `Null`.
    fn column(&self, slug: &str) -> Option<Arc<Vec<CellValue>>>;

    fn has_slug(&self, slug: &str) -> bool {
        self.slugs().iter().any(|s| s == slug)
    }
}

/// Rows as supplied, e.g. from a row array or delimited text.
pub struct RowStore {
    rows: Vec<Row>,
    slugs: Vec<String>,
    columns: OnceLock<BTreeMap<String, Arc<Vec<CellValue>>>>,
}

impl RowStore {
    pub fn new(rows: Vec<Row>) -> Self {
        Self::with_slug_order(rows, Vec::new())
    }

    /// Store `rows`, listing `order` first among the slugs. Slugs that only
    /// appear in the rows follow in first-seen order.
    pub fn with_slug_order(rows: Vec<Row>, order: Vec<String>) -> Self {
        let mut seen: BTreeSet<String> = order.iter().cloned().collect();
        let mut slugs = order;
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.clone()) {
                    slugs.push(key.clone());
                }
            }
        }
        Self {
            rows,
            slugs,
            columns: OnceLock::new(),
        }
    }

    fn columns(&self) -> &BTreeMap<String, Arc<Vec<CellValue>>> {
        self.columns.get_or_init(|| {
            tracing::trace!(rows = self.rows.len(), "building column view from rows");
            self.slugs
                .iter()
                .map(|slug| {
                    let values = self
                        .rows
                        .iter()
                        .map(|row| row.get(slug).cloned().unwrap_or(CellValue::Null))
                        .collect();
                    (slug.clone(), Arc::new(values))
                })
                .collect()
        })
    }
}

impl fmt::Debug for RowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStore")
            .field("rows", &self.rows.len())
            .field("slugs", &self.slugs)
            .finish()
    }
}

impl TableStorage for RowStore {
    fn engine(&self) -> StorageEngine {
        StorageEngine::Rows
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn slugs(&self) -> &[String] {
        &self.slugs
    }

    fn cell(&self, row: usize, slug: &str) -> Option<&CellValue> {
        self.rows.get(row)?.get(slug)
    }

    fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn column(&self, slug: &str) -> Option<Arc<Vec<CellValue>>> {
        self.columns().get(slug).cloned()
    }
}

/// Column vectors keyed by slug, e.g. from a column-store map.
///
/// Vectors are reference counted so derived tables can share them.
pub struct ColumnarStore {
    order: Vec<String>,
    columns: BTreeMap<String, Arc<Vec<CellValue>>>,
    num_rows: usize,
    rows: OnceLock<Vec<Row>>,
}

impl ColumnarStore {
    /// Every column must have the same length and a distinct slug.
    pub fn new<I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Arc<Vec<CellValue>>)>,
    {
        let mut order = Vec::new();
        let mut map = BTreeMap::new();
        let mut num_rows: Option<usize> = None;
        for (slug, values) in columns {
            let expected = *num_rows.get_or_insert(values.len());
            if values.len() != expected {
                tracing::warn!(slug = %slug, expected, actual = values.len(), "column length mismatch");
                return Err(TableError::ColumnLengthMismatch {
                    slug,
                    expected,
                    actual: values.len(),
                });
            }
            if map.contains_key(&slug) {
                return Err(TableError::DuplicateSlug { slug });
            }
            order.push(slug.clone());
            map.insert(slug, values);
        }
        Ok(Self {
            order,
            columns: map,
            num_rows: num_rows.unwrap_or(0),
            rows: OnceLock::new(),
        })
    }
}

impl ColumnarStore {
    /// Columns taken from an existing table, already known to be distinct
    /// and `num_rows` long.
    pub(crate) fn from_shared(num_rows: usize, columns: Vec<(String, Arc<Vec<CellValue>>)>) -> Self {
        let order = columns.iter().map(|(slug, _)| slug.clone()).collect();
        Self {
            order,
            columns: columns.into_iter().collect(),
            num_rows,
            rows: OnceLock::new(),
        }
    }
}

impl fmt::Debug for ColumnarStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnarStore")
            .field("rows", &self.num_rows)
            .field("slugs", &self.order)
            .finish()
    }
}

impl TableStorage for ColumnarStore {
    fn engine(&self) -> StorageEngine {
        StorageEngine::Columns
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn slugs(&self) -> &[String] {
        &self.order
    }

    fn cell(&self, row: usize, slug: &str) -> Option<&CellValue> {
        self.columns.get(slug)?.get(row)
    }

    fn rows(&self) -> &[Row] {
        self.rows.get_or_init(|| {
            tracing::trace!(rows = self.num_rows, "building row view from columns");
            (0..self.num_rows)
                .map(|index| {
                    self.columns
                        .iter()
                        .map(|(slug, values)| (slug.clone(), values[index].clone()))
                        .collect()
                })
                .collect()
        })
    }

    fn column(&self, slug: &str) -> Option<Arc<Vec<CellValue>>> {
        self.columns.get(slug).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartable_model::row;

    fn shared(values: &[f64]) -> Arc<Vec<CellValue>> {
        Arc::new(values.iter().copied().map(CellValue::Number).collect())
    }

    #[test]
    fn test_row_store_column_view() {
        let store = RowStore::new(vec![
            row([("a", CellValue::from(1)), ("b", CellValue::from("x"))]),
            row([("a", CellValue::from(2))]),
        ]);
        assert_eq!(store.slugs(), ["a", "b"]);
        assert_eq!(store.cell(1, "b"), None);
        assert_eq!(
            *store.column("b").unwrap(),
            vec![CellValue::from("x"), CellValue::Null]
        );
    }

    #[test]
    fn test_slug_order_is_respected() {
        let store = RowStore::with_slug_order(
            vec![row([("a", CellValue::from(1)), ("z", CellValue::from(2))])],
            vec!["z".to_string()],
        );
        assert_eq!(store.slugs(), ["z", "a"]);
    }

    #[test]
    fn test_columnar_store_row_view() {
        let store = ColumnarStore::new([
            ("x".to_string(), shared(&[1.0, 2.0])),
            ("y".to_string(), shared(&[3.0, 4.0])),
        ])
        .unwrap();
        assert_eq!(store.num_rows(), 2);
        assert_eq!(store.rows()[1]["y"], CellValue::Number(4.0));
        assert_eq!(store.engine(), StorageEngine::Columns);
    }

    #[test]
    fn test_columnar_store_rejects_ragged_columns() {
        let err = ColumnarStore::new([
            ("x".to_string(), shared(&[1.0, 2.0])),
            ("y".to_string(), shared(&[3.0])),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::ColumnLengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_columnar_store_shares_vectors() {
        let values = shared(&[1.0]);
        let store = ColumnarStore::new([("x".to_string(), Arc::clone(&values))]).unwrap();
        assert!(Arc::ptr_eq(&store.column("x").unwrap(), &values));
    }
}
