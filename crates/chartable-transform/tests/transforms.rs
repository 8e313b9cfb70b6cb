use chartable_model::{CellValue, ColumnStore, ErrorValue, TableError};
use chartable_transform::{TransformExpression, TransformName, apply_expression, apply_transform};

fn store() -> ColumnStore {
    let mut store = ColumnStore::new();
    store.insert(
        "entityName".to_string(),
        ["France", "France", "France", "Spain", "Spain"]
            .into_iter()
            .map(CellValue::from)
            .collect(),
    );
    store.insert(
        "day".to_string(),
        [0, 1, 2, 0, 1].into_iter().map(CellValue::from).collect(),
    );
    store.insert(
        "cases".to_string(),
        vec![
            CellValue::Number(10.0),
            CellValue::Number(20.0),
            CellValue::Error(ErrorValue::NotParseableAsNumber),
            CellValue::Number(4.0),
            CellValue::Number(8.0),
        ],
    );
    store.insert(
        "population".to_string(),
        [100.0, 100.0, 100.0, 0.0, 50.0].into_iter().map(CellValue::from).collect(),
    );
    store
}

#[test]
fn divide_by_propagates_sentinels_and_zero_division() {
    let out = apply_expression(&store(), "divideBy cases population").unwrap();
    assert_eq!(
        out,
        vec![
            CellValue::Number(0.1),
            CellValue::Number(0.2),
            CellValue::Error(ErrorValue::NotParseableAsNumber),
            CellValue::Error(ErrorValue::DivideByZero),
            CellValue::Number(0.16),
        ]
    );
}

#[test]
fn multiply_by_literal_and_column() {
    let by_literal = apply_expression(&store(), "multiplyBy cases 2").unwrap();
    assert_eq!(by_literal[0], CellValue::Number(20.0));
    let by_column = apply_expression(&store(), "multiplyBy cases population").unwrap();
    assert_eq!(by_column[4], CellValue::Number(400.0));
}

#[test]
fn rolling_average_is_per_entity() {
    let out = apply_expression(&store(), "rollingAverage day entityName cases 2").unwrap();
    assert_eq!(
        out,
        vec![
            CellValue::Number(10.0),
            CellValue::Number(15.0),
            CellValue::Error(ErrorValue::NotParseableAsNumber),
            CellValue::Number(4.0),
            CellValue::Number(6.0),
        ]
    );
}

#[test]
fn where_filters_rows() {
    let out = apply_expression(&store(), "where cases day isGreaterThanOrEqual 1").unwrap();
    assert_eq!(out[0], CellValue::Error(ErrorValue::FilteredOut));
    assert_eq!(out[1], CellValue::Number(20.0));
    assert_eq!(out[4], CellValue::Number(8.0));
}

#[test]
fn cumulative_sum_and_duplicate() {
    let sums = apply_expression(&store(), "cumulativeSum entityName cases").unwrap();
    assert_eq!(sums[1], CellValue::Number(30.0));
    assert_eq!(sums[4], CellValue::Number(12.0));
    let copy = apply_expression(&store(), "duplicate cases").unwrap();
    assert_eq!(copy, store()["cases"]);
}

#[test]
fn faults_are_errors() {
    assert!(matches!(
        apply_expression(&store(), "divideBy cases missing"),
        Err(TableError::MissingColumn { slug }) if slug == "missing"
    ));
    assert!(matches!(
        apply_expression(&store(), "teleport cases"),
        Err(TableError::UnknownTransform { .. })
    ));
    assert!(matches!(
        apply_expression(&store(), "rollingAverage day entityName cases seven"),
        Err(TableError::InvalidTransform { .. })
    ));
}

#[test]
fn mismatched_lengths_are_errors() {
    let mut store = store();
    store.insert("short".to_string(), vec![CellValue::Number(1.0)]);
    assert!(matches!(
        apply_expression(&store, "subtract cases short"),
        Err(TableError::ColumnLengthMismatch { expected: 5, actual: 1, .. })
    ));
}

#[test]
fn rolling_transforms_accept_days_far_apart() {
    let mut store = ColumnStore::new();
    store.insert("entityName".to_string(), vec![CellValue::from("France"); 2]);
    store.insert(
        "day".to_string(),
        vec![CellValue::Number(-9e18), CellValue::Number(9e18)],
    );
    store.insert(
        "cases".to_string(),
        vec![CellValue::Number(1.0), CellValue::Number(3.0)],
    );
    let rolled = apply_expression(&store, "rollingAverage day entityName cases 2").unwrap();
    assert_eq!(rolled, vec![CellValue::Number(1.0), CellValue::Number(3.0)]);
    let changed = apply_expression(&store, "percentChange day entityName cases 7").unwrap();
    assert_eq!(
        changed,
        vec![CellValue::Error(ErrorValue::NoPriorValueForComparison); 2]
    );
}

#[test]
fn percent_change_over_zero_window_is_zero() {
    let out = apply_expression(&store(), "percentChange day entityName cases 0").unwrap();
    assert_eq!(
        out,
        vec![
            CellValue::Number(0.0),
            CellValue::Number(0.0),
            CellValue::Error(ErrorValue::NotParseableAsNumber),
            CellValue::Number(0.0),
            CellValue::Number(0.0),
        ]
    );
}

#[test]
fn expressions_built_from_parts_are_checked() {
    assert!(matches!(
        TransformExpression::new(TransformName::DivideBy, Vec::new()),
        Err(TableError::InvalidTransform { .. })
    ));
    let expr = TransformExpression::new(
        TransformName::Subtract,
        vec!["cases".to_string(), "population".to_string()],
    )
    .unwrap();
    assert_eq!(apply_transform(&store(), &expr).unwrap()[0], CellValue::Number(-90.0));
}
