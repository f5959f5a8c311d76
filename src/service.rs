//! Relay service wiring
//!
//! Fetch → validate/map → publish → mark delivered. The service owns no
//! retry or breaker logic; all failure-handling policy lives in the publish
//! engine.

use std::sync::Arc;

use courier_common::{RecordKey, Signal, TraceId};
use courier_ingest::{RecordSource, SourceError, canonicalize};
use courier_publish::{BatchPublisher, MessageEntry};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::dispatch::Trigger;

/// Outcome of one relay invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Records fetched from the source
    pub fetched: usize,
    /// Records excluded by validation
    pub invalid: usize,
    /// Entries acknowledged by the downstream
    pub delivered: usize,
    /// Entries permanently failed
    pub failed: usize,
}

impl RelayReport {
    /// Whether every fetched record was relayed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.invalid == 0 && self.failed == 0
    }
}

/// Relay flow errors
///
/// Publish failures are not errors — they are reported through the
/// [`RelayReport`]. Only upstream faults surface here.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream source could not be queried.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A canonical message could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Orchestrates one relay invocation end to end
#[derive(Debug)]
pub struct RelayService {
    source: Arc<dyn RecordSource>,
    publisher: BatchPublisher,
}

impl RelayService {
    /// Create a new relay service
    #[must_use]
    pub const fn new(source: Arc<dyn RecordSource>, publisher: BatchPublisher) -> Self {
        Self { source, publisher }
    }

    /// Run one relay invocation
    ///
    /// # Errors
    /// If the upstream source fails or a canonical message cannot be
    /// serialized. Delivery failures never surface as errors; they are
    /// counted in the returned report.
    pub async fn run(
        &self,
        trigger: Trigger,
        cancel: &mut broadcast::Receiver<Signal>,
    ) -> Result<RelayReport, RelayError> {
        let trace_id = TraceId::generate();

        let records = match trigger {
            Trigger::Latest { limit } => self.source.fetch_latest(limit).await?,
            Trigger::Keys { keys } => {
                let mut records = Vec::with_capacity(keys.len());
                for key in &keys {
                    match self.source.fetch_by_key(key).await? {
                        Some(record) => records.push(record),
                        None => warn!(record_key = %key, "Record not found at source"),
                    }
                }
                records
            }
        };

        let fetched = records.len();
        let mut invalid = 0usize;
        let mut entries = Vec::with_capacity(records.len());
        for record in &records {
            match canonicalize(record) {
                Ok(message) => {
                    let payload = message.to_payload()?;
                    entries.push(MessageEntry::new(RecordKey::new(message.key), payload));
                }
                Err(error) => {
                    warn!(
                        record_key = %record.key,
                        error = %error,
                        "Record failed validation, excluded from batch"
                    );
                    invalid += 1;
                }
            }
        }

        let result = self.publisher.publish(entries, &trace_id, cancel).await;

        // Flip the delivered flag for acknowledged records; the engine's
        // responsibility ended at reporting which keys succeeded
        if !result.delivered().is_empty()
            && let Err(error) = self.source.mark_delivered(result.delivered()).await
        {
            warn!(error = %error, "Failed to mark delivered records at source");
        }

        let report = RelayReport {
            fetched,
            invalid,
            delivered: result.delivered_count(),
            failed: result.failed_count(),
        };
        info!(
            trace_id = %trace_id,
            fetched = report.fetched,
            invalid = report.invalid,
            delivered = report.delivered,
            failed = report.failed,
            summary = %result.summary(),
            "Relay run complete"
        );

        Ok(report)
    }
}
