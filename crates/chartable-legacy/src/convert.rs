use std::collections::BTreeMap;

use serde_json::Value;

use chartable_core::Table;
use chartable_core::kinds::day_from_iso;
use chartable_model::{CellValue, ColumnDef, ColumnKind, Result, Row, TableError, Time, slugs};

use crate::types::{ChartDimension, LegacyDisplay, LegacyVariable, LegacyVariablesAndEntityKey, value_key};

fn legacy_error(message: impl Into<String>) -> TableError {
    TableError::Legacy {
        message: message.into(),
    }
}

fn convert_value(value: &Value, factor: Option<f64>) -> CellValue {
    match value {
        Value::Number(n) => match (n.as_f64(), factor) {
            (Some(v), Some(factor)) => CellValue::Number(v * factor),
            (Some(v), None) => CellValue::Number(v),
            (None, _) => CellValue::Text(n.to_string()),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

fn column_def(slug: &str, variable: &LegacyVariable, display: &LegacyDisplay) -> ColumnDef {
    let numeric = variable
        .values
        .iter()
        .all(|v| v.is_number() || v.is_null());
    let mut def = ColumnDef::new(slug).with_kind(if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::String
    });
    def.name = display.name.clone().or_else(|| variable.name.clone());
    def.unit = display.unit.clone().or_else(|| variable.unit.clone());
    def.short_unit = display.short_unit.clone().or_else(|| variable.short_unit.clone());
    def.num_decimal_places = display.num_decimal_places;
    def.tolerance = display.tolerance;
    def.description = variable.description.clone();
    def.source_name = variable.source.as_ref().and_then(|s| s.name.clone());
    def
}

/// Time slug and the offset added to each stored time.
fn time_axis(display: &LegacyDisplay) -> Result<(&'static str, Time)> {
    if !display.year_is_day.unwrap_or(false) {
        return Ok((slugs::YEAR, 0));
    }
    let offset = match &display.zero_day {
        Some(zero_day) => {
            day_from_iso(zero_day).ok_or_else(|| legacy_error(format!("invalid zeroDay `{zero_day}`")))?
        }
        None => 0,
    };
    Ok((slugs::DAY, offset))
}

/// Build a table from legacy variables and the chart's dimensions.
///
/// Every data point lands on the row for its entity and time, so variables
/// sharing an entity and time share a row. Dimension display settings win
/// over the variable's own. Numeric values are multiplied by the
/// `conversionFactor`. Rows are sorted by entity name, then time.
pub fn legacy_to_table(legacy: &LegacyVariablesAndEntityKey, dimensions: &[ChartDimension]) -> Result<Table> {
    let overrides: BTreeMap<String, &LegacyDisplay> = dimensions
        .iter()
        .map(|dimension| (dimension.variable_key(), &dimension.display))
        .collect();

    let mut defs = vec![
        ColumnDef::new(slugs::ENTITY_NAME).with_kind(ColumnKind::EntityName),
        ColumnDef::new(slugs::ENTITY_ID).with_kind(ColumnKind::EntityId),
        ColumnDef::new(slugs::ENTITY_CODE).with_kind(ColumnKind::EntityCode),
    ];
    let mut time_slugs: Vec<&'static str> = Vec::new();
    let mut rows: BTreeMap<(String, &'static str, Time), Row> = BTreeMap::new();

    for (key, variable) in &legacy.variables {
        let slug = variable.id.as_ref().map_or_else(|| key.clone(), value_key);
        let display = match overrides.get(&slug).or_else(|| overrides.get(key)) {
            Some(over) => variable.display.overridden_by(over),
            None => variable.display.clone(),
        };
        let len = variable.values.len();
        if variable.years.len() != len || variable.entities.len() != len {
            return Err(legacy_error(format!(
                "variable {slug} has {} years, {} entities and {len} values",
                variable.years.len(),
                variable.entities.len()
            )));
        }
        let (time_slug, offset) = time_axis(&display)?;
        if !time_slugs.contains(&time_slug) {
            time_slugs.push(time_slug);
        }

        for ((&time, &entity_id), value) in variable.years.iter().zip(&variable.entities).zip(&variable.values) {
            let entity = legacy
                .entity_key
                .get(&entity_id.to_string())
                .ok_or_else(|| legacy_error(format!("entity {entity_id} is missing from the entity key")))?;
            let time = time + offset;
            let row = rows
                .entry((entity.name.clone(), time_slug, time))
                .or_insert_with(|| {
                    let mut row = Row::new();
                    row.insert(slugs::ENTITY_NAME.to_string(), CellValue::from(entity.name.as_str()));
                    row.insert(slugs::ENTITY_ID.to_string(), CellValue::from(entity_id));
                    if let Some(code) = &entity.code {
                        row.insert(slugs::ENTITY_CODE.to_string(), CellValue::from(code.as_str()));
                    }
                    row.insert(time_slug.to_string(), CellValue::from(time));
                    row
                });
            row.insert(slug.clone(), convert_value(value, display.conversion_factor));
        }
        defs.push(column_def(&slug, variable, &display));
    }

    for time_slug in time_slugs.iter().rev() {
        let kind = if *time_slug == slugs::DAY {
            ColumnKind::Day
        } else {
            ColumnKind::Year
        };
        defs.insert(3, ColumnDef::new(*time_slug).with_kind(kind));
    }

    tracing::debug!(
        variables = legacy.variables.len(),
        rows = rows.len(),
        "converted legacy variables"
    );
    Table::from_rows(rows.into_values().collect(), defs)
}

/// Parse legacy JSON and convert it with [`legacy_to_table`].
pub fn legacy_json_to_table(json: &str, dimensions: &[ChartDimension]) -> Result<Table> {
    let legacy: LegacyVariablesAndEntityKey =
        serde_json::from_str(json).map_err(|e| legacy_error(e.to_string()))?;
    legacy_to_table(&legacy, dimensions)
}
