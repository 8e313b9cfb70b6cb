//! Entity- and time-aware operations.
//!
//! These read the entity column (`entityName`) and the table's time column
//! (see [`Table::time_slug`]). Without them, entity-scoped operations treat
//! every row as belonging to one unnamed entity.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chartable_model::{CellValue, Result, Row, TableError, Time, slugs};
use chartable_time::{find_closest_time, interpolate_row_values_with_tolerance};

use crate::column::OwidRow;
use crate::ops::step_span;
use crate::step::TransformKind;
use crate::table::Table;

const VALUE_KEY: &str = "value";
const TIME_KEY: &str = "time";

fn time_of(cell: &CellValue) -> Option<Time> {
    cell.as_number().map(|t| t as Time)
}

impl Table {
    fn entity_at(&self, row: usize) -> String {
        self.entity_name_slug()
            .and_then(|slug| self.get_values_for(slug))
            .and_then(|values| values.get(row))
            .map(CellValue::to_plain_string)
            .unwrap_or_default()
    }

    fn time_at(&self, row: usize) -> Option<Time> {
        let slug = self.time_slug()?;
        time_of(self.get_values_for(slug)?.get(row)?)
    }

    /// Row indices per entity, entities in first-seen order.
    fn rows_per_entity(&self) -> Vec<(String, Vec<usize>)> {
        let mut order: Vec<(String, Vec<usize>)> = Vec::new();
        let mut position: BTreeMap<String, usize> = BTreeMap::new();
        for row in 0..self.num_rows() {
            let entity = self.entity_at(row);
            let slot = *position.entry(entity.clone()).or_insert_with(|| {
                order.push((entity, Vec::new()));
                order.len() - 1
            });
            order[slot].1.push(row);
        }
        order
    }

    /// Distinct entity names in first-seen order.
    pub fn available_entity_names(&self) -> Vec<String> {
        let Some(values) = self.entity_name_slug().and_then(|slug| self.get_values_for(slug)) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        values
            .iter()
            .filter(|cell| cell.is_real())
            .map(CellValue::to_plain_string)
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Keep rows for the named entities.
    pub fn filter_by_entity_names(&self, names: &[&str]) -> Table {
        let wanted: BTreeSet<&str> = names.iter().copied().collect();
        self.filter_rows(
            |_, row| wanted.contains(self.entity_at(row).as_str()),
            format!("keep entities {}", names.join(", ")),
        )
    }

    /// Keep rows whose time lies in `start..=end`.
    pub fn filter_by_time_range(&self, start: Time, end: Time) -> Table {
        self.filter_rows(
            |_, row| self.time_at(row).is_some_and(|time| (start..=end).contains(&time)),
            format!("keep times {start} to {end}"),
        )
    }

    /// For each entity and each target, keep the row whose time is closest to
    /// the target within `tolerance`. A row matching several targets is kept once.
    pub fn filter_by_target_times(&self, targets: &[Time], tolerance: Time) -> Table {
        let _span = step_span(TransformKind::FilterRows);
        let started = Instant::now();
        let mut keep: BTreeSet<usize> = BTreeSet::new();
        for (_, rows) in self.rows_per_entity() {
            let timed: Vec<(usize, Time)> = rows
                .iter()
                .filter_map(|&row| Some((row, self.time_at(row)?)))
                .collect();
            let times: Vec<Time> = timed.iter().map(|&(_, time)| time).collect();
            for &target in targets {
                let Some(closest) = find_closest_time(&times, target, Some(tolerance)) else {
                    continue;
                };
                keep.extend(timed.iter().filter(|&&(_, time)| time == closest).map(|&(row, _)| row));
            }
        }
        let indices: Vec<usize> = keep.into_iter().collect();
        let targets = targets.iter().map(Time::to_string).collect::<Vec<_>>().join(", ");
        self.with_row_subset(
            TransformKind::FilterRows,
            format!("keep rows closest to {targets} within {tolerance}"),
            &indices,
            started,
        )
    }

    /// Fill sentinel cells of `slug` from the nearest real value of the same
    /// entity no more than `tolerance` time units away. `None` uses the
    /// column's own tolerance.
    ///
    /// The table's time column is left as is; the time each value came from
    /// is written to `<slug>-originalTime`, replacing any earlier one.
    pub fn interpolate_column_with_tolerance(&self, slug: &str, tolerance: Option<Time>) -> Result<Table> {
        let column = self.get(slug)?;
        let time_slug = self
            .time_slug()
            .ok_or_else(|| TableError::missing_column(slugs::TIME))?;
        let time_def = self.get(time_slug)?.def().clone();
        let tolerance = tolerance.unwrap_or_else(|| column.tolerance());
        let time_cells = self.get_values_for(time_slug).unwrap_or_default();

        let mut values = column.values().to_vec();
        let mut origins = time_cells.to_vec();
        for (_, mut rows) in self.rows_per_entity() {
            rows.sort_by_key(|&row| self.time_at(row));
            let series: Vec<Row> = rows
                .iter()
                .map(|&row| {
                    Row::from([
                        (VALUE_KEY.to_string(), values[row].clone()),
                        (TIME_KEY.to_string(), time_cells[row].clone()),
                    ])
                })
                .collect();
            let filled = interpolate_row_values_with_tolerance(&series, VALUE_KEY, TIME_KEY, tolerance);
            for (&row, out) in rows.iter().zip(filled) {
                if let Some(value) = out.get(VALUE_KEY) {
                    values[row] = value.clone();
                }
                if let Some(time) = out.get(TIME_KEY) {
                    origins[row] = time.clone();
                }
            }
        }

        let origin_def = time_def
            .renamed(slugs::original_time_slug(slug))
            .with_name(format!("{} (original time)", column.display_name()));
        self.with_replaced_columns(
            TransformKind::InterpolateColumn,
            format!("interpolate {slug} with tolerance {tolerance}"),
            vec![(column.def().clone(), values), (origin_def, origins)],
        )
    }

    /// Distinct real times, ascending.
    pub fn times_uniq_sorted_asc(&self) -> Vec<Time> {
        self.time_slug()
            .and_then(|slug| self.get_values_for(slug))
            .map(|cells| {
                cells
                    .iter()
                    .filter_map(time_of)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn min_time(&self) -> Option<Time> {
        self.times_uniq_sorted_asc().first().copied()
    }

    pub fn max_time(&self) -> Option<Time> {
        self.times_uniq_sorted_asc().last().copied()
    }

    /// `{entityName, time, value}` for every real value of `slug`.
    pub fn owid_rows(&self, slug: &str) -> Option<&[OwidRow]> {
        self.get_column(slug).map(|column| column.owid_rows())
    }

    /// Real values of `slug` keyed by entity name, then time.
    pub fn value_by_entity_name_and_time(&self, slug: &str) -> Option<&BTreeMap<String, BTreeMap<Time, CellValue>>> {
        self.get_column(slug)
            .map(|column| column.value_by_entity_name_and_time())
    }
}
