//! Audit store contract

use async_trait::async_trait;

use crate::{
    Result,
    record::{AuditRecord, AuditRecordId},
};

/// Append-only sink for audit records
///
/// The publish engine only ever appends; it never reads or updates existing
/// rows. Append failures must be recoverable by the caller — the publish flow
/// logs them and continues.
#[async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug {
    /// Append a record to the store
    ///
    /// # Errors
    /// If the record cannot be persisted
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId>;
}
