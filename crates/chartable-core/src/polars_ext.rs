//! Conversion to and from polars data frames.

use std::sync::Arc;
use std::time::Instant;

use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, Series};

use chartable_model::{CellValue, ColumnDef, ColumnKind, Result, TableError};

use crate::step::TransformKind;
use crate::storage::ColumnarStore;
use crate::table::{Draft, Table};

fn frame_error(error: impl ToString) -> TableError {
    TableError::Frame {
        message: error.to_string(),
    }
}

/// Cell for a polars value. Nulls stay raw so the column kind decides the sentinel.
pub fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Null,
        AnyValue::Boolean(b) => CellValue::Bool(b),
        AnyValue::Int8(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int16(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int32(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int64(v) => CellValue::Number(v as f64),
        AnyValue::UInt8(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt16(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt32(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt64(v) => CellValue::Number(v as f64),
        AnyValue::Float32(v) => CellValue::Number(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Number(v),
        AnyValue::String(s) => CellValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => CellValue::Text(s.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}

impl Table {
    /// Data frame of the materialized cells. Numeric kinds become `f64`
    /// columns, booleans `bool`, everything else strings; sentinels are null.
    pub fn to_data_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.num_columns());
        for def in self.defs() {
            let cells = self.get_values_for(&def.slug).unwrap_or_default();
            let name = def.slug.as_str().into();
            let column: Column = match def.kind_or_default() {
                ColumnKind::Boolean => {
                    let values: Vec<Option<bool>> = cells.iter().map(CellValue::as_bool).collect();
                    Series::new(name, values).into()
                }
                kind if kind.is_numeric() => {
                    let values: Vec<Option<f64>> = cells.iter().map(CellValue::as_number).collect();
                    Series::new(name, values).into()
                }
                _ => {
                    let values: Vec<Option<String>> = cells
                        .iter()
                        .map(|cell| cell.is_real().then(|| cell.to_plain_string()))
                        .collect();
                    Series::new(name, values).into()
                }
            };
            columns.push(column);
        }
        DataFrame::new(columns).map_err(frame_error)
    }

    /// Load a data frame. Undeclared columns get detected definitions.
    pub fn from_data_frame(frame: &DataFrame, defs: Vec<ColumnDef>) -> Result<Table> {
        let started = Instant::now();
        let height = frame.height();
        let columns = frame
            .get_columns()
            .iter()
            .map(|column| {
                let cells = (0..height)
                    .map(|row| any_to_cell(column.get(row).unwrap_or(AnyValue::Null)))
                    .collect();
                (column.name().to_string(), Arc::new(cells))
            })
            .collect::<Vec<_>>();
        let draft = Draft {
            defs,
            storage: Box::new(ColumnarStore::new(columns)?),
            parsed_slugs: Default::default(),
        };
        Table::build(
            draft,
            None,
            TransformKind::LoadFromDataFrame,
            format!("load data frame {height}x{}", frame.width()),
            started,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartable_model::ErrorValue;

    #[test]
    fn test_data_frame_round_trip() {
        let table = Table::from_delimited("entityName,year,gdp\nFrance,2000,1.5\nPeru,2001,n/a").unwrap();
        let frame = table.to_data_frame().unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 3);

        let back = Table::from_data_frame(&frame, Vec::new()).unwrap();
        assert_eq!(back.column_slugs(), ["entityName", "year", "gdp"]);
        assert_eq!(back.get_values_for("gdp").unwrap()[0], CellValue::Number(1.5));
        assert_eq!(
            back.get_values_for("gdp").unwrap()[1],
            CellValue::Error(ErrorValue::NullButShouldBeNumber)
        );
    }

    #[test]
    fn test_any_to_cell() {
        assert_eq!(any_to_cell(AnyValue::Int32(4)), CellValue::Number(4.0));
        assert_eq!(any_to_cell(AnyValue::String("x")), CellValue::from("x"));
        assert_eq!(any_to_cell(AnyValue::Null), CellValue::Null);
    }
}
