//! Downstream transport contract

use async_trait::async_trait;

use crate::{
    error::TransportError,
    types::{EntryId, MessageEntry},
};

/// Per-entry failure as reported by the downstream
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Attempt-scoped id of the refused entry
    pub id: EntryId,
    /// Downstream failure code
    pub code: String,
    /// Downstream failure detail
    pub message: String,
}

/// Result of one accepted batch call
///
/// Every submitted entry is expected to appear in exactly one of the two
/// sets; entries in neither are treated as failed by the executor.
#[derive(Debug, Clone, Default)]
pub struct BatchResponse {
    /// Ids acknowledged as delivered
    pub delivered: Vec<EntryId>,
    /// Entries the downstream refused, with code and message
    pub failed: Vec<BatchFailure>,
}

impl BatchResponse {
    /// Response acknowledging every submitted entry
    #[must_use]
    pub fn ack_all(entries: &[MessageEntry]) -> Self {
        Self {
            delivered: entries.iter().map(|entry| entry.id.clone()).collect(),
            failed: Vec::new(),
        }
    }
}

/// Client for the downstream queue
///
/// One call delivers at most one batch; the batch size accepted must not
/// exceed the partitioner's group size. A returned error means the whole call
/// failed and no entry was acknowledged.
#[async_trait]
pub trait QueueTransport: Send + Sync + std::fmt::Debug {
    /// Send one delivery group downstream
    ///
    /// # Errors
    /// If the call as a whole fails (network or service fault)
    async fn send_batch(
        &self,
        target: &str,
        entries: &[MessageEntry],
    ) -> Result<BatchResponse, TransportError>;
}

/// Transport that acknowledges every entry without sending anywhere
///
/// Useful for local runs and wiring tests; production deployments implement
/// [`QueueTransport`] against their actual queue.
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport;

impl LoopbackTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueueTransport for LoopbackTransport {
    async fn send_batch(
        &self,
        target: &str,
        entries: &[MessageEntry],
    ) -> Result<BatchResponse, TransportError> {
        tracing::debug!(
            target_queue = %target,
            items = entries.len(),
            "Loopback transport acknowledging batch"
        );
        Ok(BatchResponse::ack_all(entries))
    }
}
