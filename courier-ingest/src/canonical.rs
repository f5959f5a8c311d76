//! Validation and reshaping of candidate records into canonical messages
//!
//! This is deterministic, single-pass business logic: a record either maps to
//! exactly one canonical message or fails with a typed validation error.
//! Nothing here retries or keeps state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, record::CandidateRecord};

/// Maximum accepted record key length
pub const MAX_KEY_LENGTH: usize = 128;

/// The canonical outbound message shape
///
/// Attribute ordering is stabilized (`BTreeMap`) so the serialized payload is
/// byte-identical for identical records, which keeps downstream deduplication
/// and test assertions simple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// Stable identifier of the originating record
    pub key: String,
    /// Schema kind of the record
    pub kind: String,
    /// Validated record body
    pub body: serde_json::Value,
    /// When the underlying event occurred
    pub occurred_at: DateTime<Utc>,
    /// Attributes, stably ordered
    pub attributes: BTreeMap<String, String>,
}

impl CanonicalMessage {
    /// Serialize the message into the payload sent downstream
    ///
    /// # Errors
    /// If JSON serialization fails
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Validate a candidate record and reshape it into a canonical message
///
/// # Errors
/// Returns the first validation rule the record violates:
/// - key present, non-blank, and at most [`MAX_KEY_LENGTH`] characters
/// - kind non-empty and limited to `[a-z0-9._-]`
/// - body neither null nor absent
/// - `occurred_at` present
pub fn canonicalize(record: &CandidateRecord) -> Result<CanonicalMessage, ValidationError> {
    let key = record.key.trim();
    if key.is_empty() {
        return Err(ValidationError::MissingKey);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(ValidationError::KeyTooLong(key.len()));
    }

    if record.kind.is_empty()
        || !record
            .kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidKind(record.kind.clone()));
    }

    if record.body.is_null() {
        return Err(ValidationError::EmptyBody);
    }

    let occurred_at = record.occurred_at.ok_or(ValidationError::MissingTimestamp)?;

    Ok(CanonicalMessage {
        key: key.to_string(),
        kind: record.kind.clone(),
        body: record.body.clone(),
        occurred_at,
        attributes: record
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}
