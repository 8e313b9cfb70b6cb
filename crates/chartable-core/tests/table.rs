use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chartable_core::{
    CellValue, ColumnDef, ColumnKind, ErrorValue, Row, SortOrder, StorageEngine, Table,
};

const GDP: &str = "entityName,year,gdp\nFrance,2000,1.5\nPeru,2000,20\nFrance,2001,3";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("chartable_core=debug")
        .try_init();
}

#[test]
fn delimited_round_trip_keeps_slugs_and_cells() {
    let table = Table::from_delimited(GDP).unwrap();
    assert_eq!(table.to_csv().unwrap(), format!("{GDP}\n"));

    let quoted = "name,note\n\"Bonaire, Sint Eustatius\",\"say \"\"hi\"\"\"\n";
    let table = Table::from_delimited(quoted).unwrap();
    assert_eq!(table.get_values_for("name").unwrap()[0], CellValue::from("Bonaire, Sint Eustatius"));
    assert_eq!(table.get_values_for("note").unwrap()[0], CellValue::from("say \"hi\""));
    assert_eq!(table.to_csv().unwrap(), quoted);
}

#[test]
fn declared_definitions_round_trip_in_header_order() {
    let defs = vec![ColumnDef::new("gdp").with_kind(ColumnKind::Numeric)];
    let table = Table::from_delimited_with_options(GDP, defs, &Default::default()).unwrap();
    assert_eq!(table.column_slugs(), ["entityName", "year", "gdp"]);
    assert_eq!(table.to_csv().unwrap(), format!("{GDP}\n"));
}

#[test]
fn tab_separated_input_is_detected() {
    let table = Table::from_delimited("entityName\tyear\nFrance\t2000").unwrap();
    assert_eq!(table.column_slugs(), ["entityName", "year"]);
    assert_eq!(table.to_tsv().unwrap(), "entityName\tyear\nFrance\t2000\n");
}

#[test]
fn repeated_transforms_give_equal_tables() {
    let table = Table::from_delimited(GDP).unwrap();
    let once = table
        .filter_by_entity_names(&["France"])
        .sort_by_columns(&["year"], SortOrder::Desc)
        .unwrap()
        .with_renamed_columns(&[("gdp", "output")])
        .unwrap();
    let twice = table
        .filter_by_entity_names(&["France"])
        .sort_by_columns(&["year"], SortOrder::Desc)
        .unwrap()
        .with_renamed_columns(&[("gdp", "output")])
        .unwrap();
    assert!(once.content_eq(&twice));

    let sorted_again = once.sort_by_columns(&["year"], SortOrder::Desc).unwrap();
    assert!(sorted_again.rows() == once.rows());
}

#[test]
fn transformations_leave_the_parent_unchanged() {
    let table = Table::from_delimited(GDP).unwrap();
    let before = table.rows().to_vec();
    let _ = table.filter_by_entity_names(&["Peru"]);
    let _ = table.without_columns(&["gdp"]);
    let _ = table.interpolate_column_with_tolerance("gdp", Some(1)).unwrap();
    let _ = table
        .append_rows(vec![Row::from([("entityName".to_string(), CellValue::from("Chile"))])], "add")
        .unwrap();
    assert_eq!(table.rows(), before.as_slice());
    assert_eq!(table.column_slugs(), ["entityName", "year", "gdp"]);
}

#[test]
fn computed_columns_are_evaluated_once_per_table() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let per_capita = ColumnDef::new("gdpTimesTen")
        .with_kind(ColumnKind::Numeric)
        .with_compute(move |row: &Row| {
            counter.fetch_add(1, Ordering::SeqCst);
            match row.get("gdp").and_then(CellValue::as_number) {
                Some(gdp) => CellValue::Number(gdp * 10.0),
                None => CellValue::Error(ErrorValue::NotParseableAsNumber),
            }
        });
    let table = Table::from_delimited_with_options(GDP, vec![per_capita], &Default::default()).unwrap();

    for _ in 0..5 {
        let _ = table.rows();
        let _ = table.get_column("gdpTimesTen").map(|column| column.summary().mean);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let child = table.filter_by_entity_names(&["France"]);
    assert_eq!(
        child.get_values_for("gdpTimesTen").unwrap(),
        [CellValue::Number(15.0), CellValue::Number(30.0)]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn provenance_reaches_the_root() {
    init_logging();
    let table = Table::from_delimited(GDP).unwrap();
    let derived = table
        .filter_by_entity_names(&["France"])
        .sort_by_columns(&["year"], SortOrder::Desc)
        .unwrap()
        .without_columns(&["gdp"]);

    assert_eq!(derived.num_steps(), 4);
    assert!(derived.root_table().is_root());
    assert_eq!(derived.root_table().num_rows(), 3);
    insta::assert_snapshot!(derived.explain_short(), @r"
    0. LoadFromDelimited (3 rows, 3 columns): load delimited text
    1. FilterRows (2 rows, 3 columns): keep entities France
    2. SortRows (2 rows, 3 columns): sort by year descending
    3. FilterColumns (2 rows, 2 columns): drop columns gdp
    ");
    assert!(derived.explain().lines().any(|line| line.contains("columns: entityName, year")));
}

#[test]
fn storage_engines_read_the_same() {
    let rows = Table::from_delimited(GDP).unwrap();
    let columns = Table::from_column_store(rows.column_store(), rows.defs().to_vec()).unwrap();
    assert_eq!(rows.storage_engine(), StorageEngine::Rows);
    assert_eq!(columns.storage_engine(), StorageEngine::Columns);
    for slug in ["entityName", "year", "gdp"] {
        assert_eq!(rows.get_values_for(slug), columns.get_values_for(slug));
    }
}

#[test]
fn transform_columns_follow_filters() {
    let table = Table::from_delimited_with_options(
        "entityName,day,cases\nFrance,0,2\nFrance,1,4\nFrance,2,6\nPeru,0,10",
        vec![ColumnDef::new("smoothed").with_transform("rollingAverage day entityName cases 2")],
        &Default::default(),
    )
    .unwrap();
    assert_eq!(
        table.get_values_for("smoothed").unwrap(),
        [
            CellValue::Number(2.0),
            CellValue::Number(3.0),
            CellValue::Number(5.0),
            CellValue::Number(10.0),
        ]
    );
    let peru = table.filter_by_entity_names(&["Peru"]).without_columns(&["cases"]);
    assert_eq!(peru.get_values_for("smoothed").unwrap(), [CellValue::Number(10.0)]);
}

#[test]
fn empty_text_gives_an_empty_table() {
    let table = Table::from_delimited("").unwrap();
    assert_eq!(table.num_rows(), 0);
    assert_eq!(table.num_columns(), 0);
    assert_eq!(table.available_entity_names(), Vec::<String>::new());
}
