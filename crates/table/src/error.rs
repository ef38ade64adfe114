use thiserror::Error;

/// Errors raised while loading, mutating, or writing back the table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header row is missing or empty")]
    EmptyHeader,

    #[error("blank column name at position {0}")]
    BlankColumn(usize),

    #[error("duplicate column '{0}' in header")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("row {row} is missing a value for column '{column}'")]
    MissingField { row: usize, column: String },

    #[error("row index {0} out of bounds")]
    RowOutOfBounds(usize),

    #[error("column '{column}' holds {len} values, expected {expected}")]
    RaggedColumn {
        column: String,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, TableError>;
