//! Error types for the composable-enrichment library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}' in table")]
    MissingColumn(String),

    #[error("Duplicate column '{0}' in table")]
    DuplicateColumn(String),

    #[error("Class '{0}' is not part of the count table")]
    MissingClass(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, EnrichError>;
