//! Error types for metrics aggregation and report rendering.

use thiserror::Error;

/// Errors raised while aggregating counters or rendering summaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetricsError {
    /// A fragment value could not be read as a non-negative integer.
    #[error("invalid count '{value}' for counter '{label}'")]
    InvalidCount { label: String, value: String },

    /// Adding to a counter would exceed `u64::MAX`.
    #[error("counter '{label}' overflowed")]
    CountOverflow { label: String },

    /// The stage summary needs a counter the entry never received.
    #[error("missing counter '{counter}' for key {key}")]
    MissingCounter { key: String, counter: &'static str },

    /// A key does not have the shape the requested report reads.
    #[error("malformed key '{key}': expected {expected}")]
    MalformedKey { key: String, expected: &'static str },

    /// An increment record could not be decoded.
    #[error("invalid increment record: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the tab-separated report failed.
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
