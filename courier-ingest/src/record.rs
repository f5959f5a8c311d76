//! Candidate records as fetched from the upstream source

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record as the upstream source hands it over, prior to validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Stable identifier of the record at the source
    pub key: String,
    /// Schema kind of the record (e.g. `order.created`)
    pub kind: String,
    /// Raw record body
    pub body: serde_json::Value,
    /// When the underlying event occurred
    pub occurred_at: Option<DateTime<Utc>>,
    /// Free-form attributes carried alongside the body
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Whether the record has already been relayed downstream
    #[serde(default)]
    pub delivered: bool,
}

impl CandidateRecord {
    /// Create a new undelivered record
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        kind: impl Into<String>,
        body: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            body,
            occurred_at: Some(occurred_at),
            attributes: HashMap::new(),
            delivered: false,
        }
    }
}
