use thiserror::Error;

/// Errors raised when building or querying a [`crate::Table`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("row {index} out of range for table with {rows} rows")]
    RowOutOfRange { index: usize, rows: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
