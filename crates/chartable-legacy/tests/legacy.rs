use chartable_core::{CellValue, ColumnKind, ErrorValue};
use chartable_legacy::{ChartDimension, LegacyDisplay, legacy_json_to_table};
use chartable_model::TableError;
use serde_json::Value;

const PAYLOAD: &str = r#"{
    "variables": {
        "3": {
            "id": 3,
            "name": "GDP",
            "unit": "dollars",
            "shortUnit": "$",
            "source": { "name": "World Bank" },
            "years": [2001, 2000, 2000],
            "entities": [1, 1, 2],
            "values": [2.5, 2, null],
            "display": { "conversionFactor": 1000, "numDecimalPlaces": 1 }
        },
        "7": {
            "id": 7,
            "name": "Population",
            "years": [2000, 2000],
            "entities": [2, 1],
            "values": [33, 67]
        }
    },
    "entityKey": {
        "1": { "name": "France", "code": "FRA" },
        "2": { "name": "Peru", "code": "PER" }
    }
}"#;

#[test]
fn builds_one_row_per_entity_and_time() {
    let table = legacy_json_to_table(PAYLOAD, &[]).unwrap();
    assert_eq!(
        table.column_slugs(),
        ["entityName", "entityId", "entityCode", "year", "3", "7"]
    );
    insta::assert_snapshot!(table.to_csv().unwrap().trim_end(), @r"
    entityName,entityId,entityCode,year,3,7
    France,1,FRA,2000,2000,67
    France,1,FRA,2001,2500,
    Peru,2,PER,2000,,33
    ");
    assert_eq!(
        table.get_values_for("3").unwrap()[2],
        CellValue::Error(ErrorValue::NullButShouldBeNumber)
    );
}

#[test]
fn variable_display_fills_definitions() {
    let table = legacy_json_to_table(PAYLOAD, &[]).unwrap();
    let gdp = table.def("3").unwrap();
    assert_eq!(gdp.display_name(), "GDP");
    assert_eq!(gdp.kind, Some(ColumnKind::Numeric));
    assert_eq!(gdp.short_unit.as_deref(), Some("$"));
    assert_eq!(gdp.num_decimal_places, Some(1));
    assert_eq!(gdp.source_name.as_deref(), Some("World Bank"));
}

#[test]
fn chart_dimension_display_wins() {
    let dimensions = [ChartDimension {
        variable_id: Value::from(3),
        display: LegacyDisplay {
            name: Some("Output".to_string()),
            conversion_factor: Some(1.0),
            ..LegacyDisplay::default()
        },
    }];
    let table = legacy_json_to_table(PAYLOAD, &dimensions).unwrap();
    assert_eq!(table.def("3").unwrap().display_name(), "Output");
    assert_eq!(table.def("3").unwrap().num_decimal_places, Some(1));
    assert_eq!(table.get_values_for("3").unwrap()[1], CellValue::Number(2.5));
}

#[test]
fn day_based_variables_use_the_day_column() {
    let payload = r#"{
        "variables": {
            "9": {
                "years": [0, 1],
                "entities": [1, 1],
                "values": [5, 6],
                "display": { "yearIsDay": true, "zeroDay": "2020-01-22" }
            }
        },
        "entityKey": { "1": { "name": "France" } }
    }"#;
    let table = legacy_json_to_table(payload, &[]).unwrap();
    assert!(table.has_column("day"));
    assert!(!table.has_column("year"));
    assert_eq!(table.times_uniq_sorted_asc(), [1, 2]);
}

#[test]
fn malformed_payloads_are_errors() {
    assert!(matches!(
        legacy_json_to_table("{not json", &[]),
        Err(TableError::Legacy { .. })
    ));
    let mismatched = r#"{"variables": {"1": {"years": [2000], "entities": [], "values": [1]}}}"#;
    assert!(matches!(
        legacy_json_to_table(mismatched, &[]),
        Err(TableError::Legacy { .. })
    ));
    let unknown_entity = r#"{"variables": {"1": {"years": [2000], "entities": [4], "values": [1]}}}"#;
    assert!(matches!(
        legacy_json_to_table(unknown_entity, &[]),
        Err(TableError::Legacy { .. })
    ));
}
