use thiserror::Error;

/// Faults raised by table construction and transformation.
///
/// Data-quality problems are never reported here; they travel inside cells
/// as [`ErrorValue`](crate::ErrorValue) sentinels.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("duplicate column slug: {slug}")]
    DuplicateSlug { slug: String },

    #[error("column not found: {slug}")]
    MissingColumn { slug: String },

    #[error("unknown transform: {name}")]
    UnknownTransform { name: String },

    #[error("invalid transform `{expression}`: {message}")]
    InvalidTransform { expression: String, message: String },

    #[error("transform columns form a cycle through {slug}")]
    TransformCycle { slug: String },

    #[error("{operation} requires non-empty input")]
    EmptyInput { operation: String },

    #[error("column {slug} has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        slug: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to parse delimited text: {message}")]
    Delimited { message: String },

    #[error("invalid search pattern: {message}")]
    InvalidRegex { message: String },

    #[error("failed to read legacy variables: {message}")]
    Legacy { message: String },

    #[error("data frame conversion failed: {message}")]
    Frame { message: String },
}

impl TableError {
    pub fn missing_column(slug: impl Into<String>) -> Self {
        Self::MissingColumn { slug: slug.into() }
    }

    pub fn empty_input(operation: impl Into<String>) -> Self {
        Self::EmptyInput {
            operation: operation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
