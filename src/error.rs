//! Error types for the estate-automl pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AutoMlError>;

/// Main error type for preprocessing and model selection
#[derive(Error, Debug)]
pub enum AutoMlError {
    /// `fit` was called with zero rows or zero columns.
    #[error("Cannot fit preprocessor: {0}")]
    NotFitted(String),

    /// `transform` was called before a successful `fit`.
    #[error("Preprocessor has not been fitted yet")]
    UnfittedState,

    #[error("Schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}, mistyped columns {mistyped:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
        mistyped: Vec<String>,
    },

    #[error("Target column '{0}' not found")]
    MissingTarget(String),

    #[error("No candidate models registered")]
    NoCandidates,

    /// Every registered candidate failed, so there is no best model.
    #[error("No candidate produced a usable score ({} failed)", failures.len())]
    NoUsableCandidate { failures: Vec<CandidateError> },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Unsupported dtype {dtype} for column '{column}'")]
    UnsupportedColumnType { column: String, dtype: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// A primitive failure raised while fitting or scoring one candidate model.
#[derive(Error, Debug)]
#[error("candidate '{model}' failed: {source}")]
pub struct CandidateError {
    pub model: String,
    #[source]
    pub source: AutoMlError,
}

impl CandidateError {
    pub fn new(model: impl Into<String>, source: AutoMlError) -> Self {
        Self {
            model: model.into(),
            source,
        }
    }
}

impl From<polars::error::PolarsError> for AutoMlError {
    fn from(err: polars::error::PolarsError) -> Self {
        AutoMlError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AutoMlError {
    fn from(err: serde_json::Error) -> Self {
        AutoMlError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AutoMlError {
    fn from(err: ndarray::ShapeError) -> Self {
        AutoMlError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
