//! A column bound to one table, with memoized views.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use chartable_model::{CellValue, ColumnDef, ColumnKind, ErrorValue, FormatOptions, Time};

use crate::kinds::{KindBehavior, behavior};
use crate::summary::ColumnSummary;

/// An `{entityName, time, value}` triple for a real value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwidRow {
    pub entity_name: String,
    pub time: Time,
    pub value: CellValue,
}

/// A column of a [`Table`](crate::Table). Derived views are computed on first access.
#[derive(Debug)]
pub struct Column {
    def: ColumnDef,
    behavior: &'static KindBehavior,
    values: Arc<Vec<CellValue>>,
    entity_names: Option<Arc<Vec<CellValue>>>,
    times: Option<Arc<Vec<CellValue>>>,
    parsed: OnceLock<Vec<CellValue>>,
    summary: OnceLock<ColumnSummary>,
    rows_by_entity: OnceLock<BTreeMap<String, Vec<usize>>>,
    rows_by_time: OnceLock<BTreeMap<Time, Vec<usize>>>,
    by_entity_and_time: OnceLock<BTreeMap<String, BTreeMap<Time, CellValue>>>,
    owid_rows: OnceLock<Vec<OwidRow>>,
}

fn time_of(cell: &CellValue) -> Option<Time> {
    cell.as_number().map(|t| t as Time)
}

fn entity_of(cell: &CellValue) -> Option<String> {
    cell.is_real().then(|| cell.to_plain_string())
}

impl Column {
    pub(crate) fn new(
        def: ColumnDef,
        values: Arc<Vec<CellValue>>,
        entity_names: Option<Arc<Vec<CellValue>>>,
        times: Option<Arc<Vec<CellValue>>>,
    ) -> Self {
        let behavior = behavior(def.kind_or_default());
        Self {
            def,
            behavior,
            values,
            entity_names,
            times,
            parsed: OnceLock::new(),
            summary: OnceLock::new(),
            rows_by_entity: OnceLock::new(),
            rows_by_time: OnceLock::new(),
            by_entity_and_time: OnceLock::new(),
            owid_rows: OnceLock::new(),
        }
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn slug(&self) -> &str {
        &self.def.slug
    }

    pub fn display_name(&self) -> &str {
        self.def.display_name()
    }

    pub fn kind(&self) -> ColumnKind {
        self.behavior.kind
    }

    pub fn behavior(&self) -> &'static KindBehavior {
        self.behavior
    }

    pub fn tolerance(&self) -> Time {
        self.def.tolerance.unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every cell, sentinels included, one per row.
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Real values only, in row order.
    pub fn parsed_values(&self) -> &[CellValue] {
        self.parsed
            .get_or_init(|| self.values.iter().filter(|v| v.is_real()).cloned().collect())
    }

    /// Real numbers only, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_number).collect()
    }

    /// Sentinels in row order.
    pub fn error_values(&self) -> Vec<ErrorValue> {
        self.values.iter().filter_map(CellValue::error).collect()
    }

    pub fn num_errors(&self) -> usize {
        self.summary().error_count
    }

    pub fn summary(&self) -> &ColumnSummary {
        self.summary
            .get_or_init(|| ColumnSummary::from_cells(&self.values))
    }

    pub fn min(&self) -> Option<f64> {
        self.summary().min
    }

    pub fn max(&self) -> Option<f64> {
        self.summary().max
    }

    pub fn is_all_integers(&self) -> bool {
        self.summary().is_all_integers
    }

    /// Distinct real values in first-seen order.
    pub fn unique_values(&self) -> Vec<CellValue> {
        let mut seen = std::collections::HashSet::new();
        self.parsed_values()
            .iter()
            .filter(|v| seen.insert(v.to_plain_string()))
            .cloned()
            .collect()
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            num_decimal_places: self.def.num_decimal_places,
            unit: self.def.unit.clone(),
            use_short_unit: self.def.short_unit.is_some(),
            short_unit: self.def.short_unit.clone(),
            ..FormatOptions::default()
        }
    }

    /// Render `cell` with this column's kind and definition.
    pub fn format_value(&self, cell: &CellValue) -> String {
        self.behavior.format_cell(cell, &self.format_options())
    }

    /// Render `cell`, letting `options` override the definition.
    pub fn format_value_with(&self, cell: &CellValue, options: &FormatOptions) -> String {
        let defaults = self.format_options();
        let merged = FormatOptions {
            num_decimal_places: options.num_decimal_places.or(defaults.num_decimal_places),
            unit: options.unit.clone().or(defaults.unit),
            use_short_unit: options.use_short_unit || defaults.use_short_unit,
            short_unit: options.short_unit.clone().or(defaults.short_unit),
            ..options.clone()
        };
        self.behavior.format_cell(cell, &merged)
    }

    /// Row indices per entity name. Empty without an entity column.
    pub fn rows_by_entity_name(&self) -> &BTreeMap<String, Vec<usize>> {
        self.rows_by_entity.get_or_init(|| {
            let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            if let Some(entities) = &self.entity_names {
                for (row, cell) in entities.iter().enumerate() {
                    if let Some(name) = entity_of(cell) {
                        index.entry(name).or_default().push(row);
                    }
                }
            }
            index
        })
    }

    /// Row indices per time. Empty without a time column.
    pub fn rows_by_time(&self) -> &BTreeMap<Time, Vec<usize>> {
        self.rows_by_time.get_or_init(|| {
            let mut index: BTreeMap<Time, Vec<usize>> = BTreeMap::new();
            if let Some(times) = &self.times {
                for (row, cell) in times.iter().enumerate() {
                    if let Some(time) = time_of(cell) {
                        index.entry(time).or_default().push(row);
                    }
                }
            }
            index
        })
    }

    fn real_points(&self) -> impl Iterator<Item = (String, Time, &CellValue)> {
        let entities = self.entity_names.as_deref().map(Vec::as_slice).unwrap_or(&[]);
        let times = self.times.as_deref().map(Vec::as_slice).unwrap_or(&[]);
        self.values
            .iter()
            .zip(entities)
            .zip(times)
            .filter_map(|((value, entity), time)| {
                if !value.is_real() {
                    return None;
                }
                Some((entity_of(entity)?, time_of(time)?, value))
            })
    }

    /// `{entityName, time, value}` for every row with a real value.
    pub fn owid_rows(&self) -> &[OwidRow] {
        self.owid_rows.get_or_init(|| {
            self.real_points()
                .map(|(entity_name, time, value)| OwidRow {
                    entity_name,
                    time,
                    value: value.clone(),
                })
                .collect()
        })
    }

    /// Real values keyed by entity name, then time. A later row wins when an
    /// entity has two rows at the same time.
    pub fn value_by_entity_name_and_time(&self) -> &BTreeMap<String, BTreeMap<Time, CellValue>> {
        self.by_entity_and_time.get_or_init(|| {
            let mut map: BTreeMap<String, BTreeMap<Time, CellValue>> = BTreeMap::new();
            for (entity, time, value) in self.real_points() {
                map.entry(entity).or_default().insert(time, value.clone());
            }
            map
        })
    }

    /// Value for one entity at one time, if real.
    pub fn value_at(&self, entity_name: &str, time: Time) -> Option<&CellValue> {
        self.value_by_entity_name_and_time()
            .get(entity_name)?
            .get(&time)
    }
}
