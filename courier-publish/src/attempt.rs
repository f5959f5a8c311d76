//! Delivery attempt execution and classification
//!
//! The executor is a single, stateless probe: exactly one transport call per
//! invocation, no retry, no backoff. It translates the call's result into a
//! tagged [`AttemptOutcome`] so the retry and breaker logic upstream operate
//! on data rather than error unwinding.

use std::collections::HashMap;

use crate::{
    transport::QueueTransport,
    types::{EntryId, FailedEntry, MessageEntry, codes},
};

/// Classified result of one delivery attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Every entry in the group was acknowledged
    Delivered(Vec<MessageEntry>),
    /// The downstream refused some entries; the rest were acknowledged.
    /// Failures are per-entry and never blanket-applied to the group.
    Partial {
        delivered: Vec<MessageEntry>,
        failed: Vec<FailedEntry>,
    },
    /// The call itself failed; every entry counts as failed
    Failed(Vec<FailedEntry>),
    /// The circuit breaker refused the attempt before any call was made
    Rejected(Vec<MessageEntry>),
}

impl AttemptOutcome {
    /// Status label for logging and metrics
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Partial { .. } => "partial",
            Self::Failed(_) => "failed",
            Self::Rejected(_) => "rejected",
        }
    }

    /// Whether the transport call itself completed
    ///
    /// Per-entry refusals still count as a completed call; only whole-call
    /// failures report `false`. Rejected attempts made no call at all.
    #[must_use]
    pub const fn call_succeeded(&self) -> bool {
        matches!(self, Self::Delivered(_) | Self::Partial { .. })
    }

    /// Split into acknowledged entries and failures
    #[must_use]
    pub fn into_parts(self) -> (Vec<MessageEntry>, Vec<FailedEntry>) {
        match self {
            Self::Delivered(delivered) => (delivered, Vec::new()),
            Self::Partial { delivered, failed } => (delivered, failed),
            Self::Failed(failed) => (Vec::new(), failed),
            Self::Rejected(entries) => (
                Vec::new(),
                entries
                    .into_iter()
                    .map(|entry| {
                        FailedEntry::new(entry, codes::CIRCUIT_OPEN, "circuit breaker is open")
                    })
                    .collect(),
            ),
        }
    }
}

/// Perform exactly one transport call for a delivery group and classify it
pub async fn execute_attempt(
    transport: &dyn QueueTransport,
    target: &str,
    group: &[MessageEntry],
) -> AttemptOutcome {
    match transport.send_batch(target, group).await {
        Ok(response) => {
            let mut delivered_ids: std::collections::HashSet<EntryId> =
                response.delivered.into_iter().collect();
            let mut failures: HashMap<EntryId, (String, String)> = response
                .failed
                .into_iter()
                .map(|failure| (failure.id, (failure.code, failure.message)))
                .collect();

            let mut delivered = Vec::new();
            let mut failed = Vec::new();
            for entry in group {
                if delivered_ids.remove(&entry.id) {
                    delivered.push(entry.clone());
                } else if let Some((code, message)) = failures.remove(&entry.id) {
                    failed.push(FailedEntry::new(entry.clone(), code, message));
                } else {
                    failed.push(FailedEntry::new(
                        entry.clone(),
                        codes::MISSING_ACK,
                        "entry was not acknowledged by the downstream",
                    ));
                }
            }

            // Ids we never submitted: log and drop
            if !delivered_ids.is_empty() || !failures.is_empty() {
                tracing::warn!(
                    unknown_delivered = delivered_ids.len(),
                    unknown_failed = failures.len(),
                    "Downstream acknowledged ids that were not part of this attempt"
                );
            }

            if failed.is_empty() {
                AttemptOutcome::Delivered(delivered)
            } else {
                AttemptOutcome::Partial { delivered, failed }
            }
        }
        Err(error) => {
            tracing::warn!(error = %error, items = group.len(), "Transport call failed");
            let message = error.to_string();
            AttemptOutcome::Failed(
                group
                    .iter()
                    .map(|entry| {
                        FailedEntry::new(entry.clone(), codes::TRANSPORT_ERROR, message.clone())
                    })
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use courier_common::RecordKey;

    use super::*;
    use crate::{
        error::TransportError,
        transport::{BatchFailure, BatchResponse},
    };

    fn entries(n: usize) -> Vec<MessageEntry> {
        (0..n)
            .map(|i| MessageEntry::new(RecordKey::new(format!("record-{i}")), "{}"))
            .collect()
    }

    /// Transport scripted with a single fixed reply
    #[derive(Debug)]
    enum ScriptedTransport {
        Reply(std::sync::Mutex<Option<BatchResponse>>),
        Throw(String),
    }

    #[async_trait]
    impl QueueTransport for ScriptedTransport {
        async fn send_batch(
            &self,
            _target: &str,
            entries: &[MessageEntry],
        ) -> Result<BatchResponse, TransportError> {
            match self {
                Self::Reply(response) => Ok(response
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| BatchResponse::ack_all(entries))),
                Self::Throw(message) => Err(TransportError::Unavailable(message.clone())),
            }
        }
    }

    fn reply(response: BatchResponse) -> ScriptedTransport {
        ScriptedTransport::Reply(std::sync::Mutex::new(Some(response)))
    }

    #[tokio::test]
    async fn test_full_acknowledgement_is_delivered() {
        let group = entries(3);
        let transport = reply(BatchResponse::ack_all(&group));

        let outcome = execute_attempt(&transport, "outbound", &group).await;
        assert_eq!(outcome.status(), "delivered");
        assert!(outcome.call_succeeded());

        let (delivered, failed) = outcome.into_parts();
        assert_eq!(delivered.len(), 3);
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn test_per_entry_failures_are_not_blanket_applied() {
        let group = entries(10);
        let response = BatchResponse {
            delivered: group[..7].iter().map(|e| e.id.clone()).collect(),
            failed: group[7..]
                .iter()
                .map(|e| BatchFailure {
                    id: e.id.clone(),
                    code: "throttled".to_string(),
                    message: "rate exceeded".to_string(),
                })
                .collect(),
        };
        let transport = reply(response);

        let outcome = execute_attempt(&transport, "outbound", &group).await;
        assert_eq!(outcome.status(), "partial");

        let (delivered, failed) = outcome.into_parts();
        assert_eq!(delivered.len(), 7);
        assert_eq!(failed.len(), 3);
        assert!(failed.iter().all(|f| f.code == "throttled"));
    }

    #[tokio::test]
    async fn test_whole_call_error_fails_every_entry() {
        let group = entries(4);
        let transport = ScriptedTransport::Throw("connection reset".to_string());

        let outcome = execute_attempt(&transport, "outbound", &group).await;
        assert_eq!(outcome.status(), "failed");
        assert!(!outcome.call_succeeded());

        let (delivered, failed) = outcome.into_parts();
        assert!(delivered.is_empty());
        assert_eq!(failed.len(), 4);
        assert!(failed.iter().all(|f| f.code == codes::TRANSPORT_ERROR));
        assert!(failed[0].message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unacknowledged_entries_count_as_failed() {
        let group = entries(2);
        // Downstream only mentions the first entry
        let response = BatchResponse {
            delivered: vec![group[0].id.clone()],
            failed: Vec::new(),
        };
        let transport = reply(response);

        let outcome = execute_attempt(&transport, "outbound", &group).await;
        let (delivered, failed) = outcome.into_parts();
        assert_eq!(delivered.len(), 1);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].code, codes::MISSING_ACK);
    }

    #[tokio::test]
    async fn test_rejected_outcome_maps_to_circuit_open_failures() {
        let outcome = AttemptOutcome::Rejected(entries(2));
        assert_eq!(outcome.status(), "rejected");
        assert!(!outcome.call_succeeded());

        let (delivered, failed) = outcome.into_parts();
        assert!(delivered.is_empty());
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|f| f.code == codes::CIRCUIT_OPEN));
    }
}
