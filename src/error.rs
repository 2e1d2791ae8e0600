//! Error types for user-insights

use thiserror::Error;

/// Message reported whenever a query runs before any successful upload
pub const EMPTY_STORE_MESSAGE: &str =
    "No user records in memory: the users file has not been uploaded or processed";

#[derive(Error, Debug)]
pub enum InsightsError {
    /// The upload is not a well-formed top-level JSON array
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// One array element could not be decoded into a user record
    #[error("Record {index} could not be decoded: {reason}")]
    RecordDecode { index: usize, reason: String },

    #[error("{}", EMPTY_STORE_MESSAGE)]
    EmptyStore,

    #[error("Target {target} unreachable: {detail}")]
    TargetUnreachable { target: String, detail: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// The blocking decode task panicked or was cancelled
    #[error("Ingestion task failed: {0}")]
    IngestTask(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
