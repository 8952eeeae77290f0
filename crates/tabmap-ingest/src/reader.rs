//! Reading delimited files into [`Table`]s.
//!
//! Parsing goes through Polars; the header row is checked separately so an
//! index-like leading column (an empty header, or pandas' `Unnamed: 0`) can
//! be recognised and dropped before the table reaches the pipeline.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, SerReader};
use tabmap_model::{CellValue, Column, Table};

use crate::error::{IngestError, Result};

/// Rows Polars looks at when inferring column types.
pub const DEFAULT_INFER_SCHEMA_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub infer_schema_rows: usize,
    /// Drop a leading column whose header looks like a written-out index.
    pub drop_index_column: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
            drop_index_column: true,
        }
    }
}

impl ReadOptions {
    /// Defaults, with a tab delimiter for `.tsv` and `.tab` files.
    pub fn for_path(path: &Path) -> Self {
        let tabbed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab"));
        Self {
            delimiter: if tabbed { b'\t' } else { b',' },
            ..Self::default()
        }
    }
}

/// Reads a delimited file, choosing options from its extension.
pub fn read_table(path: &Path) -> Result<Table> {
    read_table_with(path, &ReadOptions::for_path(path))
}

pub fn read_table_with(path: &Path, options: &ReadOptions) -> Result<Table> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let table = parse(bytes, &path.display().to_string(), options)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "table loaded"
    );
    Ok(table)
}

/// Reads delimited text already held in memory (an upload, stdin).
pub fn read_table_bytes(bytes: &[u8], options: &ReadOptions) -> Result<Table> {
    parse(bytes.to_vec(), "<memory>", options)
}

fn parse(bytes: Vec<u8>, input: &str, options: &ReadOptions) -> Result<Table> {
    let has_index = leading_index_column(&bytes, input, options)?;

    let delimiter = options.delimiter;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(options.infer_schema_rows))
        .map_parse_options(|parse| parse.with_separator(delimiter))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| IngestError::CsvParse {
            input: input.to_string(),
            message: e.to_string(),
        })?;

    let drop_index = options.drop_index_column && has_index;
    if drop_index {
        tracing::debug!(input, "dropping leading index column");
    }
    dataframe_to_table(&df, drop_index)
}

/// Inspects the raw header row; fails when there is none.
fn leading_index_column(bytes: &[u8], input: &str, options: &ReadOptions) -> Result<bool> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(bytes);
    let headers = reader.headers()?;
    match headers.get(0) {
        None => Err(IngestError::EmptyInput {
            input: input.to_string(),
        }),
        Some(first) => Ok(headers.len() > 1 && is_index_header(first)),
    }
}

/// True for headers a dataframe library writes above its row index.
pub fn is_index_header(name: &str) -> bool {
    let name = name.trim().trim_start_matches('\u{feff}');
    name.is_empty()
        || name
            .strip_prefix("Unnamed:")
            .is_some_and(|rest| rest.trim().parse::<usize>().is_ok())
}

/// Converts a DataFrame into a [`Table`], optionally skipping its first column.
pub fn dataframe_to_table(df: &DataFrame, skip_first: bool) -> Result<Table> {
    let height = df.height();
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns().iter().skip(usize::from(skip_first)) {
        let series = column.as_materialized_series();
        let mut values = Vec::with_capacity(height);
        for idx in 0..height {
            values.push(any_to_cell(series.get(idx)?));
        }
        columns.push(Column::new(column.name().as_str(), values));
    }
    Ok(Table::new(columns)?)
}

/// Converts a Polars value to a cell, keeping integers and floats typed.
pub fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Empty,
        AnyValue::Int8(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int16(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int32(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int64(v) => CellValue::Integer(v),
        AnyValue::UInt8(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt16(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt32(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => CellValue::Integer(v),
            Err(_) => CellValue::Text(v.to_string()),
        },
        AnyValue::Float32(v) => CellValue::Float(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Float(v),
        AnyValue::String(s) => CellValue::text(s),
        AnyValue::StringOwned(s) => CellValue::text(s.as_str()),
        AnyValue::Boolean(b) => CellValue::text(if b { "True" } else { "False" }),
        other => CellValue::Text(other.to_string()),
    }
}
