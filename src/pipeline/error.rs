//! Error types for the classification pipeline.
//!
//! Domain failures are raised as `PipelineError` and travel through
//! `anyhow::Result`, so callers that care can `downcast_ref` them.

use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// One or more columns the schema expects are not present in the input.
    #[error("Schema mismatch: missing expected column(s) {missing:?}. Available columns: {available:?}")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A numeric column holds a value that cannot be read as a number.
    #[error("Column '{column}' is numeric but row {row} holds non-numeric value '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// The schema is internally inconsistent (e.g. no outcome column).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The outcome column does not describe exactly two classes.
    #[error("Outcome column '{column}' must be binary: {reason}")]
    NonBinaryOutcome { column: String, reason: String },

    /// A categorical value was not seen when the encoder was fitted.
    #[error("Column '{column}' has category '{value}' that was not seen during training")]
    UnknownCategory { column: String, value: String },

    /// A value required for inference is missing.
    #[error("Column '{column}' is missing a value at row {row}")]
    MissingValue { column: String, row: usize },

    /// Nothing left to work with (e.g. every row dropped during cleaning).
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// A split or fold configuration cannot produce valid partitions.
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Matrix or vector dimensions do not line up.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The classifier cannot be fitted on the given data.
    #[error("Fitting failed: {0}")]
    Fit(String),

    /// A metric is undefined for the given labels.
    #[error("Metric '{metric}' is undefined: {reason}")]
    UndefinedMetric { metric: String, reason: String },
}
