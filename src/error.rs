use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Fatal errors. Anything here aborts the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read input file '{path}': {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a line did not become a transaction.
///
/// Parse, normalization and validation failures all land here; they are
/// recorded against the line and never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("missing field: {field}")]
    MissingField { field: &'static str },

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("unrecognised date '{value}'")]
    InvalidDate { value: String },

    #[error("{field} is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} is negative: {value}")]
    NegativeValue { field: &'static str, value: String },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: String },

    #[error("date {date} is outside the accepted window")]
    DateOutOfRange { date: NaiveDate },

    #[error("{field} {value} exceeds upper bound {limit}")]
    OutOfRange {
        field: &'static str,
        value: String,
        limit: String,
    },

    #[error("{field} '{value}' does not start with '{prefix}'")]
    InvalidId {
        field: &'static str,
        value: String,
        prefix: char,
    },
}

impl RejectionReason {
    /// Stable machine-readable code, used in rejection files and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::MissingField { .. } => "missing_field",
            RejectionReason::FieldCount { .. } => "field_count",
            RejectionReason::InvalidDate { .. } => "invalid_date",
            RejectionReason::InvalidNumber { .. } => "invalid_number",
            RejectionReason::NegativeValue { .. } => "negative_value",
            RejectionReason::NonPositive { .. } => "non_positive",
            RejectionReason::DateOutOfRange { .. } => "date_out_of_range",
            RejectionReason::OutOfRange { .. } => "out_of_range",
            RejectionReason::InvalidId { .. } => "invalid_id",
        }
    }
}

/// Product lookup failures. Never fatal: the enricher falls back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("product source unavailable: {0}")]
    Unavailable(String),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("unknown product '{0}'")]
    UnknownProduct(String),

    #[error("invalid catalogue response: {0}")]
    InvalidResponse(String),
}

impl LookupError {
    /// Short label for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Unavailable(_) => "unavailable",
            LookupError::Timeout(_) => "timeout",
            LookupError::UnknownProduct(_) => "unknown_product",
            LookupError::InvalidResponse(_) => "invalid_response",
        }
    }
}
