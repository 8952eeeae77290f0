//! Table ingestion and export for tabmap.
//!
//! Reading goes through Polars' CSV reader; writing uses the `csv` crate.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{IngestError, Result};
pub use reader::{
    DEFAULT_INFER_SCHEMA_ROWS, ReadOptions, any_to_cell, dataframe_to_table, is_index_header,
    read_table, read_table_bytes, read_table_with,
};
pub use writer::{to_csv_string, write_csv, write_csv_path};
