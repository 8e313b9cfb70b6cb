use proptest::prelude::*;

use chartable_core::{CellValue, ColumnDef, ColumnKind, SortOrder, Table};

fn numbers_table(values: &[i32]) -> Table {
    let cells: Vec<CellValue> = values.iter().map(|&v| CellValue::from(v)).collect();
    let defs = vec![ColumnDef::new("value").with_kind(ColumnKind::Numeric)];
    Table::from_column_store([("value", cells)], defs).unwrap()
}

proptest! {
    #[test]
    fn filter_and_inverse_partition_rows(values in prop::collection::vec(-100i32..100, 0..40), cutoff in -100i32..100) {
        let table = numbers_table(&values);
        let keep = |row: &chartable_core::Row, _: usize| {
            row["value"].as_number().is_some_and(|v| v >= f64::from(cutoff))
        };
        let kept = table.filter_rows(keep, "kept");
        let dropped = table.inverse_filter_rows(keep, "dropped");
        prop_assert_eq!(kept.num_rows() + dropped.num_rows(), values.len());
    }

    #[test]
    fn sorting_orders_numbers(values in prop::collection::vec(-100i32..100, 0..40)) {
        let sorted = numbers_table(&values).sort_by_columns(&["value"], SortOrder::Asc).unwrap();
        let out: Vec<f64> = sorted
            .get_values_for("value")
            .unwrap()
            .iter()
            .filter_map(CellValue::as_number)
            .collect();
        prop_assert_eq!(out.len(), values.len());
        prop_assert!(out.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn head_and_tail_never_exceed_the_table(values in prop::collection::vec(0i32..10, 0..20), count in 0usize..30) {
        let table = numbers_table(&values);
        prop_assert_eq!(table.head(count).num_rows(), count.min(values.len()));
        prop_assert_eq!(table.tail(count).num_rows(), count.min(values.len()));
    }
}
