use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{
    AuditError,
    record::{AuditRecord, AuditRecordId},
    store::AuditStore,
};

/// In-memory audit store implementation
///
/// Records are kept in a `Vec` protected by an `RwLock`, in append order.
/// Primarily intended for testing, but also usable for transient runs where
/// durable audit is not required.
///
/// # Capacity Management
/// The store can be configured with a maximum capacity to prevent unbounded
/// memory growth. When capacity is reached, append operations fail with an
/// error, which the publish flow treats like any other audit-append failure
/// (logged, never escalated).
#[derive(Debug, Clone)]
pub struct MemoryAuditStore {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    /// Maximum number of records to keep (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryAuditStore {
    /// Create a new empty memory store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            capacity: None,
        }
    }

    /// Create a new memory store with a capacity limit
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            capacity: Some(capacity),
        }
    }

    /// Get the current number of records in the store
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all records in append order
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Get all records for a given operation, in append order
    #[must_use]
    pub fn records_for(&self, operation: &str) -> Vec<AuditRecord> {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|record| record.operation == operation)
            .cloned()
            .collect()
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> crate::Result<AuditRecordId> {
        if let Some(cap) = self.capacity
            && self.len() >= cap
        {
            return Err(AuditError::Internal(format!(
                "Memory audit store capacity exceeded: {}/{cap} records",
                self.len(),
            )));
        }

        let id = record.id.clone();
        self.records.write()?.push(record);

        Ok(id)
    }
}
