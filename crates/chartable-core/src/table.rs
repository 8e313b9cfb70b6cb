//! The immutable table. Parsed, computed and transform values are
//! materialized on first read and cached per instance.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use chartable_model::{
    CellValue, ColumnDef, ColumnKind, ColumnStore, ErrorValue, ParseOptions, Result, Row,
    TableError, slugs,
};
use chartable_transform::{TransformExpression, apply_transform};

use crate::column::Column;
use crate::delimited::parse_delimited;
use crate::kinds::{behavior, detect_kind, first_sample};
use crate::step::{TableStep, TransformKind};
use crate::storage::{ColumnarStore, RowStore, StorageEngine, TableStorage};

type Values = BTreeMap<String, Arc<Vec<CellValue>>>;

/// An immutable, typed table. Cloning is cheap and shares everything.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

struct TableInner {
    defs: Vec<ColumnDef>,
    storage: Box<dyn TableStorage>,
    /// Slugs whose stored values are already parsed for their definition's kind.
    parsed_slugs: BTreeSet<String>,
    /// Transform columns to evaluate, in dependency order.
    transforms: Vec<(String, TransformExpression)>,
    parent: Option<Table>,
    step: TableStep,
    values: OnceLock<Values>,
    rows: OnceLock<Vec<Row>>,
    columns: OnceLock<BTreeMap<String, Column>>,
}

/// How a new table's stored data relates to its definitions.
pub(crate) struct Draft {
    pub defs: Vec<ColumnDef>,
    pub storage: Box<dyn TableStorage>,
    pub parsed_slugs: BTreeSet<String>,
}

impl Draft {
    /// Rows taken from a materialized table: every definition is present and parsed.
    pub(crate) fn complete_rows(defs: Vec<ColumnDef>, rows: Vec<Row>) -> Self {
        let order = defs.iter().map(|d| d.slug.clone()).collect();
        let parsed_slugs = defs.iter().map(|d| d.slug.clone()).collect();
        Self {
            defs,
            storage: Box::new(RowStore::with_slug_order(rows, order)),
            parsed_slugs,
        }
    }

    /// Parsed column vectors shared with another table.
    pub(crate) fn shared_columns(
        defs: Vec<ColumnDef>,
        num_rows: usize,
        columns: Vec<(String, Arc<Vec<CellValue>>)>,
    ) -> Self {
        let parsed_slugs = columns.iter().map(|(slug, _)| slug.clone()).collect();
        Self {
            defs,
            storage: Box::new(ColumnarStore::from_shared(num_rows, columns)),
            parsed_slugs,
        }
    }

    fn fully_stored(&self, slug: &str) -> bool {
        self.storage.has_slug(slug)
            && (0..self.storage.num_rows()).all(|row| self.storage.cell(row, slug).is_some())
    }
}

/// Header slugs in header order, then declared slugs the header lacks.
fn slug_order(defs: &[ColumnDef], headers: &[String]) -> Vec<String> {
    let mut order = headers.to_vec();
    for def in defs {
        if !order.contains(&def.slug) {
            order.push(def.slug.clone());
        }
    }
    order
}

fn check_unique(defs: &[ColumnDef]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for def in defs {
        if !seen.insert(def.slug.as_str()) {
            tracing::warn!(slug = %def.slug, "duplicate column slug");
            return Err(TableError::DuplicateSlug {
                slug: def.slug.clone(),
            });
        }
    }
    Ok(())
}

/// Transform columns that still need evaluating, ordered so every column
/// comes after the transform columns it reads.
fn plan_transforms(draft: &Draft) -> Result<Vec<(String, TransformExpression)>> {
    let known: BTreeSet<&str> = draft.defs.iter().map(|d| d.slug.as_str()).collect();
    let mut pending: BTreeMap<String, TransformExpression> = BTreeMap::new();
    for def in &draft.defs {
        let Some(expression) = &def.transform else {
            continue;
        };
        let parsed = TransformExpression::parse(expression)?;
        if draft.fully_stored(&def.slug) {
            continue;
        }
        if let Some(missing) = parsed.referenced_slugs().into_iter().find(|s| !known.contains(s)) {
            tracing::warn!(slug = %def.slug, missing, "transform references a missing column");
            return Err(TableError::missing_column(missing));
        }
        pending.insert(def.slug.clone(), parsed);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        slug: &str,
        pending: &BTreeMap<String, TransformExpression>,
        marks: &mut BTreeMap<String, Mark>,
        order: &mut Vec<(String, TransformExpression)>,
    ) -> Result<()> {
        match marks.get(slug) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(TableError::TransformCycle {
                    slug: slug.to_string(),
                });
            }
            None => {}
        }
        let Some(expression) = pending.get(slug) else {
            return Ok(());
        };
        marks.insert(slug.to_string(), Mark::Visiting);
        for dependency in expression.referenced_slugs() {
            visit(dependency, pending, marks, order)?;
        }
        marks.insert(slug.to_string(), Mark::Done);
        order.push((slug.to_string(), expression.clone()));
        Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut order = Vec::with_capacity(pending.len());
    for def in &draft.defs {
        visit(&def.slug, &pending, &mut marks, &mut order)?;
    }
    Ok(order)
}

impl Table {
    /// Validate `draft` and wrap it as a table.
    ///
    /// Root tables (no parent) get definitions detected for any stored slug
    /// that was not declared, and their columns follow the stored slug order. Derived tables must carry full definitions.
    /// Transform columns without a declared kind are numeric.
    pub(crate) fn build(
        mut draft: Draft,
        parent: Option<&Table>,
        kind: TransformKind,
        description: impl Into<String>,
        started: Instant,
    ) -> Result<Table> {
        if parent.is_none() {
            let declared: BTreeSet<String> = draft.defs.iter().map(|d| d.slug.clone()).collect();
            let storage = &draft.storage;
            let detected: Vec<ColumnDef> = storage
                .slugs()
                .iter()
                .filter(|slug| !declared.contains(*slug))
                .map(|slug| {
                    let sample =
                        first_sample((0..storage.num_rows()).map(|row| storage.cell(row, slug)));
                    ColumnDef::new(slug.clone()).with_kind(detect_kind(slug, sample))
                })
                .collect();
            draft.defs.extend(detected);
            let position = |def: &ColumnDef| {
                storage
                    .slugs()
                    .iter()
                    .position(|slug| *slug == def.slug)
                    .unwrap_or(usize::MAX)
            };
            draft.defs.sort_by_key(position);
        }
        for def in &mut draft.defs {
            if def.transform.is_some() && def.kind.is_none() {
                def.kind = Some(ColumnKind::Numeric);
            }
        }
        check_unique(&draft.defs)?;
        let transforms = plan_transforms(&draft)?;
        Ok(Self::assemble(draft, transforms, parent, kind, description, started))
    }

    /// Wrap a draft known to be complete and valid.
    pub(crate) fn assemble(
        draft: Draft,
        transforms: Vec<(String, TransformExpression)>,
        parent: Option<&Table>,
        kind: TransformKind,
        description: impl Into<String>,
        started: Instant,
    ) -> Table {
        let step = TableStep {
            kind,
            description: description.into(),
            elapsed: started.elapsed(),
            num_rows: draft.storage.num_rows(),
            num_columns: draft.defs.len(),
        };
        tracing::debug!(
            kind = %step.kind,
            rows = step.num_rows,
            columns = step.num_columns,
            description = %step.description,
            "table constructed"
        );
        Table {
            inner: Arc::new(TableInner {
                defs: draft.defs,
                storage: draft.storage,
                parsed_slugs: draft.parsed_slugs,
                transforms,
                parent: parent.cloned(),
                step,
                values: OnceLock::new(),
                rows: OnceLock::new(),
                columns: OnceLock::new(),
            }),
        }
    }

    // Constructors

    /// A table with no columns and no rows.
    pub fn empty() -> Table {
        let draft = Draft::complete_rows(Vec::new(), Vec::new());
        Self::assemble(draft, Vec::new(), None, TransformKind::LoadFromRows, "empty", Instant::now())
    }

    /// Load from an array of rows. Undeclared slugs get detected definitions.
    pub fn from_rows(rows: Vec<Row>, defs: Vec<ColumnDef>) -> Result<Table> {
        let started = Instant::now();
        let order = defs.iter().map(|d| d.slug.clone()).collect();
        let draft = Draft {
            defs,
            storage: Box::new(RowStore::with_slug_order(rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Self::build(draft, None, TransformKind::LoadFromRows, "load rows", started)
    }

    /// Load from column vectors keyed by slug, keeping the iteration order.
    pub fn from_column_store<I, K>(columns: I, defs: Vec<ColumnDef>) -> Result<Table>
    where
        I: IntoIterator<Item = (K, Vec<CellValue>)>,
        K: Into<String>,
    {
        let started = Instant::now();
        let storage = ColumnarStore::new(
            columns
                .into_iter()
                .map(|(slug, values)| (slug.into(), Arc::new(values))),
        )?;
        let draft = Draft {
            defs,
            storage: Box::new(storage),
            parsed_slugs: BTreeSet::new(),
        };
        Self::build(draft, None, TransformKind::LoadFromColumnStore, "load column store", started)
    }

    /// Load delimited text, sniffing tab vs comma from the header line.
    pub fn from_delimited(text: &str) -> Result<Table> {
        Self::from_delimited_with_options(text, Vec::new(), &ParseOptions::default())
    }

    pub fn from_delimited_with_options(
        text: &str,
        defs: Vec<ColumnDef>,
        options: &ParseOptions,
    ) -> Result<Table> {
        let started = Instant::now();
        let parsed = parse_delimited(text, options)?;
        let order = slug_order(&defs, &parsed.headers);
        let draft = Draft {
            defs,
            storage: Box::new(RowStore::with_slug_order(parsed.rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Self::build(draft, None, TransformKind::LoadFromDelimited, "load delimited text", started)
    }

    /// Load a matrix whose first row holds the slugs.
    pub fn from_matrix(matrix: Vec<Vec<CellValue>>, defs: Vec<ColumnDef>) -> Result<Table> {
        let started = Instant::now();
        let mut matrix = matrix.into_iter();
        let Some(header) = matrix.next() else {
            tracing::warn!("matrix has no header row");
            return Err(TableError::empty_input("from_matrix"));
        };
        let header: Vec<String> = header.iter().map(CellValue::to_plain_string).collect();
        let rows: Vec<Row> = matrix
            .map(|cells| header.iter().cloned().zip(cells).collect())
            .collect();
        let order = slug_order(&defs, &header);
        let draft = Draft {
            defs,
            storage: Box::new(RowStore::with_slug_order(rows, order)),
            parsed_slugs: BTreeSet::new(),
        };
        Self::build(draft, None, TransformKind::LoadFromMatrix, "load matrix", started)
    }

    // Materialization

    fn materialize(&self) -> Values {
        let inner = &*self.inner;
        let storage = inner.storage.as_ref();
        let num_rows = storage.num_rows();
        let stored = |slug: &str| {
            storage.has_slug(slug) && (0..num_rows).all(|row| storage.cell(row, slug).is_some())
        };

        let mut values: Values = BTreeMap::new();
        let mut computed: Vec<&ColumnDef> = Vec::new();
        for def in &inner.defs {
            let derived = def.compute.is_some() || def.transform.is_some();
            if derived && !stored(&def.slug) {
                if def.compute.is_some() {
                    computed.push(def);
                }
                continue;
            }
            if inner.parsed_slugs.contains(&def.slug) {
                if let Some(shared) = storage.column(&def.slug) {
                    values.insert(def.slug.clone(), shared);
                    continue;
                }
            }
            let kind = behavior(def.kind_or_default());
            let parsed = (0..num_rows)
                .map(|row| kind.parse_cell(storage.cell(row, &def.slug)))
                .collect();
            values.insert(def.slug.clone(), Arc::new(parsed));
        }

        for def in computed {
            let Some(compute) = &def.compute else {
                continue;
            };
            let kind = behavior(def.kind_or_default());
            let cells = (0..num_rows)
                .map(|row| match storage.cell(row, &def.slug) {
                    Some(raw) => kind.parse_cell(Some(raw)),
                    None => {
                        let snapshot: Row = values
                            .iter()
                            .map(|(slug, column)| (slug.clone(), column[row].clone()))
                            .collect();
                        kind.parse_cell(Some(&compute.call(&snapshot)))
                    }
                })
                .collect();
            tracing::trace!(slug = %def.slug, rows = num_rows, "computed column");
            values.insert(def.slug.clone(), Arc::new(cells));
        }

        for (slug, expression) in &inner.transforms {
            let store: ColumnStore = expression
                .referenced_slugs()
                .into_iter()
                .filter_map(|s| values.get(s).map(|v| (s.to_string(), v.to_vec())))
                .collect();
            let kind = behavior(self.def(slug).map_or(ColumnKind::String, ColumnDef::kind_or_default));
            let cells = match apply_transform(&store, expression) {
                Ok(cells) => cells.iter().map(|cell| kind.parse_cell(Some(cell))).collect(),
                Err(error) => {
                    tracing::warn!(slug = %slug, %error, "transform failed; filling with sentinels");
                    vec![CellValue::Error(ErrorValue::TypeMismatch); num_rows]
                }
            };
            values.insert(slug.clone(), Arc::new(cells));
        }
        values
    }

    pub(crate) fn values(&self) -> &Values {
        self.inner.values.get_or_init(|| self.materialize())
    }

    pub(crate) fn shared_values(&self, slug: &str) -> Option<Arc<Vec<CellValue>>> {
        self.values().get(slug).cloned()
    }

    // Readers

    /// Materialized rows: one cell per column, parsed, computed values included.
    pub fn rows(&self) -> &[Row] {
        self.inner.rows.get_or_init(|| {
            let values = self.values();
            (0..self.num_rows())
                .map(|row| {
                    self.inner
                        .defs
                        .iter()
                        .filter_map(|def| {
                            let column = values.get(&def.slug)?;
                            Some((def.slug.clone(), column[row].clone()))
                        })
                        .collect()
                })
                .collect()
        })
    }

    /// Rows as stored, before parsing.
    pub fn input_rows(&self) -> &[Row] {
        self.inner.storage.rows()
    }

    /// Materialized column vectors keyed by slug.
    pub fn column_store(&self) -> ColumnStore {
        self.values()
            .iter()
            .map(|(slug, values)| (slug.clone(), values.to_vec()))
            .collect()
    }

    pub fn storage_engine(&self) -> StorageEngine {
        self.inner.storage.engine()
    }

    pub fn num_rows(&self) -> usize {
        self.inner.storage.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.inner.defs.len()
    }

    pub fn column_slugs(&self) -> Vec<&str> {
        self.inner.defs.iter().map(|d| d.slug.as_str()).collect()
    }

    pub fn defs(&self) -> &[ColumnDef] {
        &self.inner.defs
    }

    pub fn def(&self, slug: &str) -> Option<&ColumnDef> {
        self.inner.defs.iter().find(|d| d.slug == slug)
    }

    pub fn has_column(&self, slug: &str) -> bool {
        self.def(slug).is_some()
    }

    fn columns(&self) -> &BTreeMap<String, Column> {
        self.inner.columns.get_or_init(|| {
            let values = self.values();
            let entities = self.entity_name_slug().and_then(|s| values.get(s).cloned());
            let times = self.time_slug().and_then(|s| values.get(s).cloned());
            self.inner
                .defs
                .iter()
                .filter_map(|def| {
                    let column_values = values.get(&def.slug)?.clone();
                    let column =
                        Column::new(def.clone(), column_values, entities.clone(), times.clone());
                    Some((def.slug.clone(), column))
                })
                .collect()
        })
    }

    pub fn get_column(&self, slug: &str) -> Option<&Column> {
        self.columns().get(slug)
    }

    /// Like [`get_column`](Self::get_column), but a missing slug is an error.
    pub fn get(&self, slug: &str) -> Result<&Column> {
        self.get_column(slug)
            .ok_or_else(|| TableError::missing_column(slug))
    }

    /// All cells of a column, sentinels included.
    pub fn get_values_for(&self, slug: &str) -> Option<&[CellValue]> {
        self.values().get(slug).map(|v| v.as_slice())
    }

    pub fn entity_name_slug(&self) -> Option<&str> {
        self.def(slugs::ENTITY_NAME).map(|d| d.slug.as_str())
    }

    /// Slug of the time column: the first of `day`, `year`, `date`, `time`
    /// present, else the first column of a time kind.
    pub fn time_slug(&self) -> Option<&str> {
        slugs::TIME_SLUGS
            .iter()
            .find_map(|slug| self.def(slug))
            .or_else(|| self.inner.defs.iter().find(|d| d.kind_or_default().is_time()))
            .map(|d| d.slug.as_str())
    }

    pub fn time_column(&self) -> Option<&Column> {
        self.time_slug().and_then(|slug| self.get_column(slug))
    }

    /// Smallest and largest real number across the named columns.
    pub fn domain_for(&self, slugs: &[&str]) -> Option<(f64, f64)> {
        slugs
            .iter()
            .filter_map(|slug| self.get_column(slug))
            .filter_map(|column| Some((column.min()?, column.max()?)))
            .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
    }

    // Provenance

    pub fn parent(&self) -> Option<&Table> {
        self.inner.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn root_table(&self) -> &Table {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// The provenance chain, root first, ending with `self`.
    pub fn ancestors(&self) -> Vec<&Table> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    pub fn step(&self) -> &TableStep {
        &self.inner.step
    }

    /// Number of tables in the provenance chain, root included.
    pub fn num_steps(&self) -> usize {
        self.ancestors().len()
    }

    /// Every step from the root with timings and the columns after each step.
    pub fn explain(&self) -> String {
        self.ancestors()
            .iter()
            .enumerate()
            .map(|(index, table)| {
                format!(
                    "{}\n   columns: {}",
                    table.step().line(index),
                    table.column_slugs().join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every step from the root, one line each, without timings.
    pub fn explain_short(&self) -> String {
        self.ancestors()
            .iter()
            .enumerate()
            .map(|(index, table)| table.step().short_line(index))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Same slugs, kinds and cells.
    pub fn content_eq(&self, other: &Table) -> bool {
        let defs_eq = self.inner.defs.len() == other.inner.defs.len()
            && self
                .inner
                .defs
                .iter()
                .zip(&other.inner.defs)
                .all(|(a, b)| a.slug == b.slug && a.kind_or_default() == b.kind_or_default());
        defs_eq && self.rows() == other.rows()
    }

    pub(crate) fn defs_vec(&self) -> Vec<ColumnDef> {
        self.inner.defs.clone()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("columns", &self.column_slugs())
            .field("rows", &self.num_rows())
            .field("step", &self.inner.step.kind)
            .field("storage", &self.inner.storage)
            .finish()
    }
}
