//! Upstream record source contract

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use courier_common::RecordKey;

use crate::{error::SourceError, record::CandidateRecord};

/// Read/flag access to the upstream source of candidate records
///
/// The relay fetches records, publishes their canonical messages, and flips
/// the delivered flag for the records whose messages the publish call
/// acknowledged. Flipping the flag is the caller's responsibility — the
/// publish engine's job ends at reporting which keys succeeded.
#[async_trait]
pub trait RecordSource: Send + Sync + std::fmt::Debug {
    /// Fetch a single record by its key
    ///
    /// # Errors
    /// If the source cannot be queried
    async fn fetch_by_key(&self, key: &str) -> Result<Option<CandidateRecord>, SourceError>;

    /// Fetch the most recent undelivered records, newest first
    ///
    /// # Errors
    /// If the source cannot be queried
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<CandidateRecord>, SourceError>;

    /// Flip the delivered flag on the given records
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// If the source cannot be updated
    async fn mark_delivered(&self, keys: &[RecordKey]) -> Result<(), SourceError>;
}

/// In-memory record source implementation
///
/// Keyed by record key behind an `RwLock`. Intended for tests and local runs;
/// production deployments implement [`RecordSource`] against their actual
/// upstream store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: Arc<RwLock<HashMap<String, CandidateRecord>>>,
}

impl MemoryRecordSource {
    /// Create a new empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any existing record with the same key
    pub fn insert(&self, record: CandidateRecord) {
        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(record.key.clone(), record);
    }

    /// Number of records currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the source is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a record's delivered flag (for tests)
    #[must_use]
    pub fn is_delivered(&self, key: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .is_some_and(|record| record.delivered)
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn fetch_by_key(&self, key: &str) -> Result<Option<CandidateRecord>, SourceError> {
        Ok(self.records.read()?.get(key).cloned())
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records: Vec<CandidateRecord> = self
            .records
            .read()?
            .values()
            .filter(|record| !record.delivered)
            .cloned()
            .collect();

        // Newest first; records without a timestamp sort last
        records.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        records.truncate(limit);

        Ok(records)
    }

    async fn mark_delivered(&self, keys: &[RecordKey]) -> Result<(), SourceError> {
        let mut records = self.records.write()?;
        for key in keys {
            if let Some(record) = records.get_mut(key.as_str()) {
                record.delivered = true;
            } else {
                tracing::debug!(record_key = %key, "Delivered flag requested for unknown record");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;

    fn record(key: &str, age_minutes: i64) -> CandidateRecord {
        CandidateRecord::new(
            key,
            "order.created",
            json!({"n": 1}),
            Utc::now() - Duration::minutes(age_minutes),
        )
    }

    #[tokio::test]
    async fn test_fetch_by_key() {
        let source = MemoryRecordSource::new();
        source.insert(record("a", 0));

        let found = source.fetch_by_key("a").await.unwrap();
        assert!(found.is_some());

        let missing = source.fetch_by_key("zzz").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fetch_latest_orders_newest_first_and_limits() {
        let source = MemoryRecordSource::new();
        source.insert(record("old", 30));
        source.insert(record("newer", 10));
        source.insert(record("newest", 1));

        let latest = source.fetch_latest(2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].key, "newest");
        assert_eq!(latest[1].key, "newer");
    }

    #[tokio::test]
    async fn test_fetch_latest_skips_delivered() {
        let source = MemoryRecordSource::new();
        source.insert(record("a", 1));
        source.insert(record("b", 2));

        source
            .mark_delivered(&[RecordKey::new("a")])
            .await
            .unwrap();

        let latest = source.fetch_latest(10).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].key, "b");
        assert!(source.is_delivered("a"));
        assert!(!source.is_delivered("b"));
    }

    #[tokio::test]
    async fn test_mark_delivered_ignores_unknown_keys() {
        let source = MemoryRecordSource::new();
        source.insert(record("a", 1));

        source
            .mark_delivered(&[RecordKey::new("a"), RecordKey::new("ghost")])
            .await
            .unwrap();

        assert!(source.is_delivered("a"));
    }
}
