use thiserror::Error;

/// Failure while reading the source file into a [`Table`](super::model::Table).
///
/// Fatal to the session: the dashboard reports it and shows no data.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row}: cannot parse date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("Row {row}: column '{column}' has invalid value '{value}'")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Expected a top-level JSON array of records")]
    NotRecords,

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// Failure of a query against a loaded table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown column '{0}'")]
    InvalidColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// The view has no rows, so a mean or an extremum is undefined.
    /// Callers render "no data" instead of treating this as fatal.
    #[error("No rows match the current selection")]
    EmptyAggregation,
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type QueryResult<T> = Result<T, QueryError>;
