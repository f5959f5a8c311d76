//! Audit record types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for an appended audit record
///
/// A globally unique ULID: collision-resistant and lexicographically sortable
/// by creation time, so store listings naturally follow emission order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuditRecordId {
    id: ulid::Ulid,
}

impl AuditRecordId {
    /// Create a record ID from a ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique record ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }
}

impl fmt::Display for AuditRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Serialize for AuditRecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> Deserialize<'de> for AuditRecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&value).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// One immutable audit row describing a delivery attempt or summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier
    pub id: AuditRecordId,
    /// Operation that produced this record (e.g. `publish.attempt`)
    pub operation: String,
    /// Whether the operation succeeded
    pub success: bool,
    /// Number of items the operation covered
    pub item_count: usize,
    /// Error description for failed operations
    pub error_message: Option<String>,
    /// Correlation id of the originating relay invocation
    pub trace_id: Option<String>,
    /// When the record was created
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a record for a successful operation
    #[must_use]
    pub fn success(operation: impl Into<String>, item_count: usize, trace_id: Option<String>) -> Self {
        Self {
            id: AuditRecordId::generate(),
            operation: operation.into(),
            success: true,
            item_count,
            error_message: None,
            trace_id,
            recorded_at: Utc::now(),
        }
    }

    /// Create a record for a failed operation
    #[must_use]
    pub fn failure(
        operation: impl Into<String>,
        item_count: usize,
        error_message: impl Into<String>,
        trace_id: Option<String>,
    ) -> Self {
        Self {
            id: AuditRecordId::generate(),
            operation: operation.into(),
            success: false,
            item_count,
            error_message: Some(error_message.into()),
            trace_id,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_constructors() {
        let ok = AuditRecord::success("publish.group", 10, Some("trace-1".to_string()));
        assert!(ok.success);
        assert_eq!(ok.item_count, 10);
        assert!(ok.error_message.is_none());

        let failed = AuditRecord::failure("publish", 1, "code-42: refused", None);
        assert!(!failed.success);
        assert_eq!(failed.error_message.as_deref(), Some("code-42: refused"));
    }

    #[test]
    fn test_record_id_serde_round_trip() {
        let id = AuditRecordId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: AuditRecordId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let ids: std::collections::HashSet<AuditRecordId> =
            (0..100).map(|_| AuditRecordId::generate()).collect();
        assert_eq!(ids.len(), 100);
    }
}
