//! Type definitions for the batch delivery engine

use std::{fmt, sync::Arc};

use courier_common::RecordKey;
use serde::{Deserialize, Serialize};

/// Well-known failure codes used in attempt outcomes and publish results
pub mod codes {
    /// The transport call itself failed; no entry was acknowledged
    pub const TRANSPORT_ERROR: &str = "transport-error";
    /// The transport acknowledged the call but listed the entry in neither
    /// the delivered nor the failed set
    pub const MISSING_ACK: &str = "missing-ack";
    /// The circuit breaker refused the attempt
    pub const CIRCUIT_OPEN: &str = "circuit-open";
    /// The publish call was cancelled before the entry could be delivered
    pub const CANCELLED: &str = "cancelled";
}

/// Identifier for one delivery attempt of one entry
///
/// Unique per attempt, not per logical record: a retried entry is reissued
/// with a fresh id, so ids are unambiguous within a single transport call.
/// ULIDs keep them collision-resistant and sortable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    id: ulid::Ulid,
}

impl EntryId {
    /// Create an entry ID from a ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique entry ID
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

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&value).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// One outbound unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Attempt-scoped identifier (fresh per retry round)
    pub id: EntryId,
    /// Stable identifier of the originating record
    pub record_key: RecordKey,
    /// Serialized canonical message (Arc for cheap cloning)
    pub payload: Arc<str>,
}

impl MessageEntry {
    /// Create a new entry with a fresh attempt id
    #[must_use]
    pub fn new(record_key: RecordKey, payload: impl Into<Arc<str>>) -> Self {
        Self {
            id: EntryId::generate(),
            record_key,
            payload: payload.into(),
        }
    }

    /// Reissue this entry for another attempt
    ///
    /// Keeps the record key and payload, generates a fresh id.
    #[must_use]
    pub fn reissued(&self) -> Self {
        Self {
            id: EntryId::generate(),
            record_key: self.record_key.clone(),
            payload: Arc::clone(&self.payload),
        }
    }
}

/// Ordered, batch-sized subset of entries: the unit of one transport call
#[derive(Debug, Clone)]
pub struct DeliveryGroup {
    entries: Vec<MessageEntry>,
}

impl DeliveryGroup {
    pub(crate) fn new(entries: Vec<MessageEntry>) -> Self {
        Self { entries }
    }

    /// Entries in this group, in input order
    #[must_use]
    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    /// Number of entries in this group
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the group is empty (never true for partitioner output)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the group, yielding its entries
    #[must_use]
    pub fn into_entries(self) -> Vec<MessageEntry> {
        self.entries
    }
}

/// One entry that failed within a delivery attempt
#[derive(Debug, Clone)]
pub struct FailedEntry {
    /// The entry as submitted in the failing attempt
    pub entry: MessageEntry,
    /// Transport-reported or synthetic failure code
    pub code: String,
    /// Human-readable failure detail
    pub message: String,
}

impl FailedEntry {
    #[must_use]
    pub fn new(entry: MessageEntry, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entry,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One logical record that permanently failed to publish
#[derive(Debug, Clone)]
pub struct FailedDelivery {
    /// Stable identifier of the failed record
    pub key: RecordKey,
    /// Failure code of the final attempt
    pub code: String,
    /// Failure detail of the final attempt
    pub message: String,
}

impl From<FailedEntry> for FailedDelivery {
    fn from(failed: FailedEntry) -> Self {
        Self {
            key: failed.entry.record_key,
            code: failed.code,
            message: failed.message,
        }
    }
}

/// Aggregate result of one publish call
///
/// Created fresh per call, accumulated across groups, returned once. The
/// overall call is a success iff no entry permanently failed.
#[derive(Debug, Clone, Default)]
pub struct PublishResult {
    delivered: Vec<RecordKey>,
    failed: Vec<FailedDelivery>,
}

impl PublishResult {
    /// Whether the publish call succeeded (zero permanent failures)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Record keys acknowledged by the downstream, in delivery order
    #[must_use]
    pub fn delivered(&self) -> &[RecordKey] {
        &self.delivered
    }

    /// Permanently failed records with their final failure details
    #[must_use]
    pub fn failed(&self) -> &[FailedDelivery] {
        &self.failed
    }

    /// Number of delivered entries
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Number of permanently failed entries
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Total entries this call accounted for
    #[must_use]
    pub fn total(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Human-readable outcome summary
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!("Published {} items", self.total())
        } else {
            format!(
                "Failed to publish {} out of {} items",
                self.failed_count(),
                self.total()
            )
        }
    }

    pub(crate) fn record_delivered(&mut self, key: RecordKey) {
        self.delivered.push(key);
    }

    pub(crate) fn record_failed(&mut self, failure: FailedDelivery) {
        self.failed.push(failure);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reissued_entry_keeps_identity_but_not_id() {
        let entry = MessageEntry::new(RecordKey::new("order-1"), "{}");
        let reissued = entry.reissued();

        assert_ne!(entry.id, reissued.id);
        assert_eq!(entry.record_key, reissued.record_key);
        assert_eq!(entry.payload, reissued.payload);
    }

    #[test]
    fn test_publish_result_summary() {
        let mut result = PublishResult::default();
        result.record_delivered(RecordKey::new("a"));
        result.record_delivered(RecordKey::new("b"));
        assert!(result.is_success());
        assert_eq!(result.summary(), "Published 2 items");

        result.record_failed(FailedDelivery {
            key: RecordKey::new("c"),
            code: codes::TRANSPORT_ERROR.to_string(),
            message: "connection reset".to_string(),
        });
        assert!(!result.is_success());
        assert_eq!(result.total(), 3);
        assert_eq!(result.summary(), "Failed to publish 1 out of 3 items");
    }

    #[test]
    fn test_entry_id_serde_round_trip() {
        let entry = MessageEntry::new(RecordKey::new("order-1"), "{\"n\":1}");
        let json = serde_json::to_string(&entry).expect("serialize");
        let back: MessageEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(entry.id, back.id);
        assert_eq!(entry.record_key, back.record_key);
    }
}
