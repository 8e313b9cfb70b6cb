//! Transformation methods. Each returns a new table whose parent is `self`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use tracing::span::EnteredSpan;

use chartable_model::{CellValue, ColumnDef, ColumnKind, ErrorValue, Result, Row, TableError};

use crate::kinds::{detect_kind, first_sample};
use crate::step::TransformKind;
use crate::storage::RowStore;
use crate::table::{Draft, Table};

/// Direction for [`Table::sort_by_columns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn rank(cell: &CellValue) -> u8 {
    match cell {
        CellValue::Number(_) => 0,
        CellValue::Bool(_) => 1,
        CellValue::Text(_) => 2,
        CellValue::Null => 3,
        CellValue::Error(_) => 4,
    }
}

/// Total order over cells: numbers, then booleans, then text, with nulls and
/// sentinels last.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x.cmp(y),
        (CellValue::Error(x), CellValue::Error(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub(crate) fn step_span(kind: TransformKind) -> EnteredSpan {
    tracing::debug_span!("table_step", kind = %kind).entered()
}

impl Table {
    /// Keep the rows at `indices`, in that order, sharing no row storage.
    pub(crate) fn with_row_subset(
        &self,
        kind: TransformKind,
        description: impl Into<String>,
        indices: &[usize],
        started: Instant,
    ) -> Table {
        let values = self.values();
        let columns = self
            .defs()
            .iter()
            .filter_map(|def| {
                let column = values.get(&def.slug)?;
                let picked = indices.iter().map(|&i| column[i].clone()).collect();
                Some((def.slug.clone(), Arc::new(picked)))
            })
            .collect();
        let draft = Draft::shared_columns(self.defs_vec(), indices.len(), columns);
        Table::assemble(draft, Vec::new(), Some(self), kind, description, started)
    }

    /// Keep `defs`, sharing the parent's values for every slug it already has.
    fn with_defs(
        &self,
        kind: TransformKind,
        description: impl Into<String>,
        defs: Vec<ColumnDef>,
        started: Instant,
    ) -> Table {
        let columns = defs
            .iter()
            .filter_map(|def| Some((def.slug.clone(), self.shared_values(&def.slug)?)))
            .collect();
        let draft = Draft::shared_columns(defs, self.num_rows(), columns);
        Table::assemble(draft, Vec::new(), Some(self), kind, description, started)
    }

    fn matching_rows(&self, predicate: impl Fn(&Row, usize) -> bool) -> Vec<usize> {
        self.rows()
            .iter()
            .enumerate()
            .filter(|(index, row)| predicate(row, *index))
            .map(|(index, _)| index)
            .collect()
    }

    /// Keep rows for which `predicate(row, index)` holds.
    pub fn filter_rows<F>(&self, predicate: F, description: impl Into<String>) -> Table
    where
        F: Fn(&Row, usize) -> bool,
    {
        let _span = step_span(TransformKind::FilterRows);
        let started = Instant::now();
        let keep = self.matching_rows(predicate);
        self.with_row_subset(TransformKind::FilterRows, description, &keep, started)
    }

    /// Keep rows for which `predicate(row, index)` does not hold.
    pub fn inverse_filter_rows<F>(&self, predicate: F, description: impl Into<String>) -> Table
    where
        F: Fn(&Row, usize) -> bool,
    {
        self.filter_rows(|row, index| !predicate(row, index), description)
    }

    /// Keep rows whose cell in `slug` satisfies `predicate`.
    pub fn filter_by_column<F>(&self, slug: &str, predicate: F) -> Result<Table>
    where
        F: Fn(&CellValue) -> bool,
    {
        let values = self
            .get_values_for(slug)
            .ok_or_else(|| TableError::missing_column(slug))?;
        let _span = step_span(TransformKind::FilterRows);
        let started = Instant::now();
        let keep: Vec<usize> = (0..values.len()).filter(|&i| predicate(&values[i])).collect();
        Ok(self.with_row_subset(
            TransformKind::FilterRows,
            format!("filter rows by column {slug}"),
            &keep,
            started,
        ))
    }

    fn is_error_at(&self, slug: &str, row: usize) -> bool {
        self.get_values_for(slug)
            .and_then(|values| values.get(row))
            .is_some_and(CellValue::is_error)
    }

    /// Drop rows where `slug` holds a sentinel.
    pub fn drop_rows_with_error_values_for_column(&self, slug: &str) -> Table {
        self.inverse_filter_rows(
            |_, row| self.is_error_at(slug, row),
            format!("drop rows with errors in {slug}"),
        )
    }

    /// Drop rows where any of `slugs` holds a sentinel.
    pub fn drop_rows_with_error_values_for_any_column(&self, slugs: &[&str]) -> Table {
        self.inverse_filter_rows(
            |_, row| slugs.iter().any(|slug| self.is_error_at(slug, row)),
            format!("drop rows with errors in any of {}", slugs.join(", ")),
        )
    }

    /// Drop rows where every one of `slugs` holds a sentinel.
    pub fn drop_rows_with_error_values_for_all_columns(&self, slugs: &[&str]) -> Table {
        self.inverse_filter_rows(
            |_, row| !slugs.is_empty() && slugs.iter().all(|slug| self.is_error_at(slug, row)),
            format!("drop rows with errors in all of {}", slugs.join(", ")),
        )
    }

    /// Append column definitions. New columns are filled by their compute
    /// function or transform, or read as undefined.
    pub fn with_added_columns(&self, defs: Vec<ColumnDef>) -> Result<Table> {
        let _span = step_span(TransformKind::AppendColumns);
        let started = Instant::now();
        let description = format!(
            "add columns {}",
            defs.iter().map(|d| d.slug.as_str()).collect::<Vec<_>>().join(", ")
        );
        let columns = self
            .defs()
            .iter()
            .filter_map(|def| Some((def.slug.clone(), self.shared_values(&def.slug)?)))
            .collect();
        let mut all_defs = self.defs_vec();
        all_defs.extend(defs);
        let draft = Draft::shared_columns(all_defs, self.num_rows(), columns);
        Table::build(draft, Some(self), TransformKind::AppendColumns, description, started)
    }

    /// Add one column from raw `values`, parsed by the definition's kind.
    pub fn with_column_values(&self, def: ColumnDef, values: Vec<CellValue>) -> Result<Table> {
        if self.has_column(&def.slug) {
            return Err(TableError::DuplicateSlug { slug: def.slug });
        }
        self.with_replaced_columns(
            TransformKind::AppendColumns,
            format!("add column {}", def.slug),
            vec![(def, values)],
        )
    }

    /// Replace (or append) columns with raw values, re-parsing them.
    pub(crate) fn with_replaced_columns(
        &self,
        kind: TransformKind,
        description: impl Into<String>,
        replacements: Vec<(ColumnDef, Vec<CellValue>)>,
    ) -> Result<Table> {
        let _span = step_span(kind);
        let started = Instant::now();
        for (def, values) in &replacements {
            if values.len() != self.num_rows() {
                return Err(TableError::ColumnLengthMismatch {
                    slug: def.slug.clone(),
                    expected: self.num_rows(),
                    actual: values.len(),
                });
            }
        }
        let mut defs = self.defs_vec();
        let mut replaced: BTreeMap<String, Arc<Vec<CellValue>>> = BTreeMap::new();
        for (def, values) in replacements {
            match defs.iter_mut().find(|d| d.slug == def.slug) {
                Some(existing) => *existing = def.clone(),
                None => defs.push(def.clone()),
            }
            replaced.insert(def.slug, Arc::new(values));
        }
        let columns = defs
            .iter()
            .filter_map(|def| {
                let values = replaced
                    .get(&def.slug)
                    .cloned()
                    .or_else(|| self.shared_values(&def.slug))?;
                Some((def.slug.clone(), values))
            })
            .collect();
        let mut draft = Draft::shared_columns(defs, self.num_rows(), columns);
        draft.parsed_slugs.retain(|slug| !replaced.contains_key(slug));
        Table::build(draft, Some(self), kind, description, started)
    }

    /// Rename columns by `(from, to)` pairs.
    pub fn with_renamed_columns(&self, renames: &[(&str, &str)]) -> Result<Table> {
        let _span = step_span(TransformKind::RenameColumns);
        let started = Instant::now();
        let mapping: BTreeMap<&str, &str> = renames.iter().copied().collect();
        if let Some((from, _)) = renames.iter().find(|(from, _)| !self.has_column(from)) {
            return Err(TableError::missing_column(*from));
        }
        let mut defs = Vec::with_capacity(self.num_columns());
        let mut columns = Vec::with_capacity(self.num_columns());
        for def in self.defs() {
            let renamed = match mapping.get(def.slug.as_str()) {
                Some(to) => def.renamed(*to),
                None => def.clone(),
            };
            if let Some(values) = self.shared_values(&def.slug) {
                columns.push((renamed.slug.clone(), values));
            }
            defs.push(renamed);
        }
        let description = format!(
            "rename {}",
            renames
                .iter()
                .map(|(from, to)| format!("{from} to {to}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let draft = Draft::shared_columns(defs, self.num_rows(), columns);
        Table::build(draft, Some(self), TransformKind::RenameColumns, description, started)
    }

    /// Drop the named columns. Unknown slugs are ignored.
    pub fn without_columns(&self, slugs: &[&str]) -> Table {
        let _span = step_span(TransformKind::FilterColumns);
        let started = Instant::now();
        let defs = self
            .defs()
            .iter()
            .filter(|def| !slugs.contains(&def.slug.as_str()))
            .cloned()
            .collect();
        self.with_defs(
            TransformKind::FilterColumns,
            format!("drop columns {}", slugs.join(", ")),
            defs,
            started,
        )
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, slugs: &[&str]) -> Result<Table> {
        let _span = step_span(TransformKind::FilterColumns);
        let started = Instant::now();
        let defs = slugs
            .iter()
            .map(|slug| {
                self.def(slug)
                    .cloned()
                    .ok_or_else(|| TableError::missing_column(*slug))
            })
            .collect::<Result<Vec<_>>>()?;
        check_distinct(slugs)?;
        Ok(self.with_defs(
            TransformKind::FilterColumns,
            format!("select columns {}", slugs.join(", ")),
            defs,
            started,
        ))
    }

    /// Stable sort of the rows by `slugs`, compared left to right.
    pub fn sort_by_columns(&self, slugs: &[&str], order: SortOrder) -> Result<Table> {
        let _span = step_span(TransformKind::SortRows);
        let started = Instant::now();
        let keys = slugs
            .iter()
            .map(|slug| {
                self.get_values_for(slug)
                    .ok_or_else(|| TableError::missing_column(*slug))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut indices: Vec<usize> = (0..self.num_rows()).collect();
        indices.sort_by(|&a, &b| {
            keys.iter()
                .map(|values| {
                    let (x, y) = (&values[a], &values[b]);
                    let ordering = compare_cells(x, y);
                    // Nulls and sentinels stay last in either direction.
                    match order {
                        SortOrder::Desc if rank(x) < 3 && rank(y) < 3 => ordering.reverse(),
                        _ => ordering,
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        let direction = match order {
            SortOrder::Asc => "ascending",
            SortOrder::Desc => "descending",
        };
        Ok(self.with_row_subset(
            TransformKind::SortRows,
            format!("sort by {} {direction}", slugs.join(", ")),
            &indices,
            started,
        ))
    }

    /// Move the named columns to the front, in order. Unknown slugs are ignored.
    pub fn sort_columns(&self, slugs: &[&str]) -> Table {
        let _span = step_span(TransformKind::SortColumns);
        let started = Instant::now();
        let mut defs: Vec<ColumnDef> = slugs.iter().filter_map(|slug| self.def(slug).cloned()).collect();
        defs.extend(
            self.defs()
                .iter()
                .filter(|def| !slugs.contains(&def.slug.as_str()))
                .cloned(),
        );
        self.with_defs(
            TransformKind::SortColumns,
            format!("sort columns {}", slugs.join(", ")),
            defs,
            started,
        )
    }

    /// Append raw rows. Every column is parsed again, and computed or
    /// transform columns are evaluated for the new rows.
    pub fn append_rows(&self, rows: Vec<Row>, description: impl Into<String>) -> Result<Table> {
        let _span = step_span(TransformKind::AppendRows);
        let started = Instant::now();
        let mut all_rows = self.rows().to_vec();
        all_rows.extend(rows);
        let order = self.defs().iter().map(|d| d.slug.clone()).collect();
        let draft = Draft {
            defs: self.defs_vec(),
            storage: Box::new(RowStore::with_slug_order(all_rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Table::build(draft, Some(self), TransformKind::AppendRows, description, started)
    }

    /// At most `count` rows starting at `offset`.
    pub fn limit(&self, count: usize, offset: usize) -> Table {
        let _span = step_span(TransformKind::FilterRows);
        let started = Instant::now();
        let end = offset.saturating_add(count).min(self.num_rows());
        let indices: Vec<usize> = (offset.min(end)..end).collect();
        self.with_row_subset(
            TransformKind::FilterRows,
            format!("limit {count} rows from {offset}"),
            &indices,
            started,
        )
    }

    pub fn head(&self, count: usize) -> Table {
        self.limit(count, 0)
    }

    pub fn tail(&self, count: usize) -> Table {
        self.limit(count, self.num_rows().saturating_sub(count))
    }

    /// Keep rows where any cell's plain text matches the regular expression.
    pub fn grep(&self, pattern: &str) -> Result<Table> {
        let regex = Regex::new(pattern).map_err(|e| TableError::InvalidRegex {
            message: e.to_string(),
        })?;
        Ok(self.filter_rows(
            |row, _| row.values().any(|cell| regex.is_match(&cell.to_plain_string())),
            format!("keep rows matching {pattern}"),
        ))
    }

    /// Map every cell of the named columns through `replace`. Unknown slugs
    /// are ignored. The results are kept as they are, without parsing.
    pub fn replace_cells<F>(&self, slugs: &[&str], replace: F) -> Table
    where
        F: Fn(&CellValue) -> CellValue,
    {
        let _span = step_span(TransformKind::UpdateRows);
        let started = Instant::now();
        let columns = self
            .defs()
            .iter()
            .filter_map(|def| {
                let values = self.shared_values(&def.slug)?;
                if slugs.contains(&def.slug.as_str()) {
                    let mapped = values.iter().map(&replace).collect();
                    Some((def.slug.clone(), Arc::new(mapped)))
                } else {
                    Some((def.slug.clone(), values))
                }
            })
            .collect();
        let draft = Draft::shared_columns(self.defs_vec(), self.num_rows(), columns);
        Table::assemble(
            draft,
            Vec::new(),
            Some(self),
            TransformKind::UpdateRows,
            format!("replace cells in {}", slugs.join(", ")),
            started,
        )
    }

    /// Turn every non-numeric real value in the named columns into
    /// [`ErrorValue::NotParseableAsNumber`]. Sentinels are kept.
    pub fn replace_non_numeric_cells_with_error_values(&self, slugs: &[&str]) -> Table {
        self.replace_cells(slugs, |cell| match cell {
            CellValue::Number(n) if !n.is_nan() => cell.clone(),
            CellValue::Error(_) => cell.clone(),
            _ => CellValue::Error(ErrorValue::NotParseableAsNumber),
        })
    }

    /// Rewrite every definition. Columns whose kind changes are parsed again.
    pub fn update_defs<F>(&self, update: F) -> Result<Table>
    where
        F: Fn(ColumnDef) -> ColumnDef,
    {
        let _span = step_span(TransformKind::UpdateDefs);
        let started = Instant::now();
        let mut defs = Vec::with_capacity(self.num_columns());
        let mut columns = Vec::with_capacity(self.num_columns());
        let mut reparse = BTreeSet::new();
        for def in self.defs() {
            let updated = update(def.clone());
            if updated.kind_or_default() != def.kind_or_default() {
                reparse.insert(updated.slug.clone());
            }
            if let Some(values) = self.shared_values(&def.slug) {
                columns.push((updated.slug.clone(), values));
            }
            defs.push(updated);
        }
        let mut draft = Draft::shared_columns(defs, self.num_rows(), columns);
        draft.parsed_slugs.retain(|slug| !reparse.contains(slug));
        Table::build(draft, Some(self), TransformKind::UpdateDefs, "update column definitions", started)
    }

    /// Swap rows and columns. The values of `by_slug` become the new column
    /// slugs; the other column slugs become the values of `by_slug`.
    pub fn transpose(&self, by_slug: &str) -> Result<Table> {
        let header_values = self
            .get_values_for(by_slug)
            .ok_or_else(|| TableError::missing_column(by_slug))?;
        let _span = step_span(TransformKind::Transpose);
        let started = Instant::now();
        let new_slugs: Vec<String> = header_values.iter().map(CellValue::to_plain_string).collect();
        check_distinct(&new_slugs)?;

        let rows: Vec<Row> = self
            .defs()
            .iter()
            .filter(|def| def.slug != by_slug)
            .map(|def| {
                let mut row = Row::new();
                row.insert(by_slug.to_string(), CellValue::Text(def.slug.clone()));
                if let Some(values) = self.get_values_for(&def.slug) {
                    for (slug, cell) in new_slugs.iter().zip(values) {
                        row.insert(slug.clone(), cell.clone());
                    }
                }
                row
            })
            .collect();

        let mut defs = vec![ColumnDef::new(by_slug).with_kind(ColumnKind::String)];
        defs.extend(new_slugs.iter().map(|slug| {
            let sample = first_sample(rows.iter().map(|row| row.get(slug)));
            ColumnDef::new(slug.clone()).with_kind(detect_kind(slug, sample))
        }));
        let order = defs.iter().map(|d| d.slug.clone()).collect();
        let draft = Draft {
            defs,
            storage: Box::new(RowStore::with_slug_order(rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Table::build(draft, Some(self), TransformKind::Transpose, format!("transpose by {by_slug}"), started)
    }

    /// Stack the rows of `tables`. Definitions come from the first table,
    /// followed by columns only later tables have. The result's parent is the
    /// first table.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let Some((first, rest)) = tables.split_first() else {
            tracing::warn!("concat called with no tables");
            return Err(TableError::empty_input("concat"));
        };
        let _span = step_span(TransformKind::Concat);
        let started = Instant::now();
        let mut defs = first.defs_vec();
        let mut rows = first.rows().to_vec();
        for table in rest {
            for def in table.defs() {
                if !defs.iter().any(|d| d.slug == def.slug) {
                    defs.push(def.clone());
                }
            }
            rows.extend_from_slice(table.rows());
        }
        let order = defs.iter().map(|d| d.slug.clone()).collect();
        let draft = Draft {
            defs,
            storage: Box::new(RowStore::with_slug_order(rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Table::build(
            draft,
            Some(first),
            TransformKind::Concat,
            format!("concat {} tables", tables.len()),
            started,
        )
    }
}

fn check_distinct<S: AsRef<str>>(slugs: &[S]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for slug in slugs {
        if !seen.insert(slug.as_ref()) {
            return Err(TableError::DuplicateSlug {
                slug: slug.as_ref().to_string(),
            });
        }
    }
    Ok(())
}
