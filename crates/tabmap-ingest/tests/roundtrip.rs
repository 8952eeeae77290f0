use std::io::Write;

use tabmap_ingest::{IngestError, ReadOptions, read_table, read_table_bytes, to_csv_string, write_csv_path};
use tabmap_model::{CellValue, Table};
use tempfile::NamedTempFile;

fn create_temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn reads_typed_cells() {
    let file = create_temp_file(".csv", "id,name,score\n1,Alice,1.5\n2,,2.0\n");
    let table = read_table(file.path()).unwrap();

    assert_eq!(table.column_names(), vec!["id", "name", "score"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column("id").unwrap().values[0], CellValue::Integer(1));
    assert_eq!(table.column("name").unwrap().values[1], CellValue::Empty);
    assert_eq!(table.column("score").unwrap().values[1].render(), "2");
}

#[test]
fn drops_pandas_index_column() {
    let file = create_temp_file(".csv", ",id,name\n0,1,Alice\n1,2,Bob\n");
    let table = read_table(file.path()).unwrap();
    assert_eq!(table.column_names(), vec!["id", "name"]);

    let named = read_table_bytes(
        b"Unnamed: 0,id\n0,1\n",
        &ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(named.column_names(), vec!["id"]);
}

#[test]
fn keeps_index_column_when_asked() {
    let options = ReadOptions {
        drop_index_column: false,
        ..ReadOptions::default()
    };
    let table = read_table_bytes(b"Unnamed: 0,id\n0,1\n", &options).unwrap();
    assert_eq!(table.column_count(), 2);
}

#[test]
fn reads_tab_separated_files() {
    let file = create_temp_file(".tsv", "a\tb\nx\ty\n");
    let table = read_table(file.path()).unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert_eq!(table.row(0).unwrap().get("b"), Some(&CellValue::text("y")));
}

#[test]
fn empty_input_is_rejected() {
    let err = read_table_bytes(b"", &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::EmptyInput { .. }));
}

#[test]
fn missing_file_is_reported() {
    let err = read_table(std::path::Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn writes_rendered_values() {
    let table = Table::from_columns(vec![
        ("id", vec![CellValue::Integer(1), CellValue::Float(2.0)]),
        ("name", vec![CellValue::text("Alice, A."), CellValue::Empty]),
    ])
    .unwrap();
    assert_eq!(to_csv_string(&table).unwrap(), "id,name\n1,\"Alice, A.\"\n2,\n");
}

#[test]
fn written_files_read_back() {
    let table = Table::from_columns(vec![("city", vec!["Oslo", "Lima"])]).unwrap();
    let out = NamedTempFile::new().unwrap();
    write_csv_path(&table, out.path()).unwrap();
    let back = read_table_with_csv(out.path());
    assert_eq!(back, table);
}

fn read_table_with_csv(path: &std::path::Path) -> Table {
    tabmap_ingest::read_table_with(path, &ReadOptions::default()).unwrap()
}
