//! Typed error handling for ingest operations.
//!
//! Validation failures are per-record and deterministic; source errors come
//! from the upstream dependency. Neither is retried by this crate.

use thiserror::Error;

/// Top-level ingest error type.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A record failed validation and was excluded from the batch.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The upstream source could not be queried.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Canonical message serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-record validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Record key is missing or blank.
    #[error("Record key is missing or blank")]
    MissingKey,

    /// Record key exceeds the maximum length.
    #[error("Record key too long: {0} characters")]
    KeyTooLong(usize),

    /// Record kind contains characters outside `[a-z0-9._-]`.
    #[error("Invalid record kind: {0}")]
    InvalidKind(String),

    /// Record body is null or absent.
    #[error("Record body is empty")]
    EmptyBody,

    /// Record is missing its occurrence timestamp.
    #[error("Record is missing occurred_at")]
    MissingTimestamp,
}

/// Errors from the upstream record source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store reported a failure.
    #[error("Source backend error: {0}")]
    Backend(String),
}

impl<T> From<std::sync::PoisonError<T>> for SourceError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Backend(format!("Lock poisoned: {e}"))
    }
}
