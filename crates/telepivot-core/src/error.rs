//! Error types shared across the crate.

use thiserror::Error;

/// A record that cannot enter the aggregation pipeline.
///
/// `index` is the zero-based position of the record in its input batch (or
/// the number of records received so far when streaming).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record {index}: invalid {field}: {reason}")]
pub struct ValidationError {
    pub index: usize,
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            index,
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("telemetry API reported an error: {0}")]
    Api(String),

    #[error("stream protocol error at line {line}: {reason}")]
    Stream { line: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
