use proptest::prelude::*;

use tabmap_model::{CellValue, Column, ModelError, Row, Table};

fn text_table(columns: Vec<(&str, Vec<&str>)>) -> Table {
    Table::from_columns(columns).unwrap()
}

#[test]
fn rejects_ragged_columns() {
    let err = Table::from_columns(vec![("a", vec!["1", "2"]), ("b", vec!["1"])]).unwrap_err();
    assert_eq!(
        err,
        ModelError::RaggedColumns {
            column: "b".to_string(),
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn rejects_duplicate_columns() {
    let err = Table::from_columns(vec![("a", vec!["1"]), ("a", vec!["2"])]).unwrap_err();
    assert_eq!(err, ModelError::DuplicateColumn("a".to_string()));
}

#[test]
fn row_reads_across_columns() {
    let table = text_table(vec![("id", vec!["1", "2"]), ("name", vec!["Alice", "Bob"])]);
    let row = table.row(1).unwrap();
    assert_eq!(row.get("id"), Some(&CellValue::text("2")));
    assert_eq!(row.get("name"), Some(&CellValue::text("Bob")));
    assert!(matches!(
        table.row(2),
        Err(ModelError::RowOutOfRange { index: 2, rows: 2 })
    ));
}

#[test]
fn slice_is_clamped() {
    let table = text_table(vec![("a", vec!["1", "2", "3"])]);
    assert_eq!(table.slice(1, 10).row_count(), 2);
    assert_eq!(table.slice(5, 10).row_count(), 0);
}

#[test]
fn select_keeps_requested_order_and_pads_unknown() {
    let table = text_table(vec![("a", vec!["1"]), ("b", vec!["2"])]);
    let selected = table.select(&["b", "z", "a"]);
    assert_eq!(selected.column_names(), vec!["b", "z", "a"]);
    assert_eq!(selected.column("z").unwrap().values, vec![CellValue::Empty]);
}

#[test]
fn append_aligns_by_name() {
    let mut table = text_table(vec![("a", vec!["1"]), ("b", vec!["2"])]);
    let other = text_table(vec![("b", vec!["4"]), ("c", vec!["5"])]);
    table.append(&other);

    assert_eq!(table.column_names(), vec!["a", "b", "c"]);
    assert_eq!(
        table.column("a").unwrap().values,
        vec![CellValue::text("1"), CellValue::Empty]
    );
    assert_eq!(
        table.column("c").unwrap().values,
        vec![CellValue::Empty, CellValue::text("5")]
    );
}

#[test]
fn push_row_adds_unknown_columns() {
    let mut table = Table::with_column_names(&["a"]);
    let first: Row = [("a", "1")].into_iter().collect();
    let second: Row = [("a", "2"), ("b", "x")].into_iter().collect();
    table.push_row(&first);
    table.push_row(&second);

    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column("b").unwrap().values,
        vec![CellValue::Empty, CellValue::text("x")]
    );
}

#[test]
fn set_column_replaces_in_place() {
    let mut table = text_table(vec![("a", vec!["1"]), ("b", vec!["2"])]);
    table
        .set_column(Column::new("a", vec![CellValue::text("9")]))
        .unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert!(table.set_column(Column::empty("c", 3)).is_err());
}

#[test]
fn column_json_is_column_oriented() {
    let table = Table::from_columns(vec![
        ("id", vec![CellValue::Integer(1), CellValue::Integer(2)]),
        ("name", vec![CellValue::text("Alice"), CellValue::Empty]),
    ])
    .unwrap();
    assert_eq!(
        serde_json::to_string(&table).unwrap(),
        r#"{"id":[1,2],"name":["Alice",""]}"#
    );
}

proptest! {
    #[test]
    fn append_never_produces_ragged_columns(
        left_rows in 0usize..6,
        right_rows in 0usize..6,
        left_cols in 1usize..4,
        right_cols in 1usize..4,
    ) {
        let left = Table::new(
            (0..left_cols).map(|i| Column::empty(format!("c{i}"), left_rows)).collect(),
        ).unwrap();
        let right = Table::new(
            (1..=right_cols).map(|i| Column::empty(format!("c{i}"), right_rows)).collect(),
        ).unwrap();

        let mut combined = left.clone();
        combined.append(&right);

        prop_assert_eq!(combined.row_count(), left_rows + right_rows);
        for column in combined.columns() {
            prop_assert_eq!(column.values.len(), left_rows + right_rows);
        }
    }
}
