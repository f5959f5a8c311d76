//! Publish coordination
//!
//! The coordinator owns the failure-handling policy of the engine: it walks
//! delivery groups strictly sequentially, gates every attempt on the circuit
//! breaker, narrows each retry round to the entries that failed in the
//! previous one, and records every attempt in the audit store before the call
//! returns. Only the aggregate [`PublishResult`] crosses this boundary — raw
//! transport errors never propagate past it.

use std::{sync::Arc, time::Instant};

use courier_audit::{AuditRecord, AuditStore};
use courier_common::{Signal, TraceId, audit};
use courier_tracing::traced;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    attempt::{self, AttemptOutcome},
    batch,
    circuit_breaker::CircuitBreaker,
    config::PublisherConfig,
    error::PublishError,
    transport::QueueTransport,
    types::{DeliveryGroup, FailedDelivery, FailedEntry, MessageEntry, PublishResult, codes},
};

/// Audit operation name for the whole publish call and per-entry failures
const OP_PUBLISH: &str = "publish";
/// Audit operation name for one transport attempt
const OP_ATTEMPT: &str = "publish.attempt";
/// Audit operation name for one settled delivery group
const OP_GROUP: &str = "publish.group";

/// Resilient batch publisher
///
/// Transport, breaker, and audit store are injected. The breaker outlives any
/// single publish call: overlapping calls against a warm publisher instance
/// share its rolling window, protecting the downstream as a whole.
#[derive(Debug)]
pub struct BatchPublisher {
    config: PublisherConfig,
    transport: Arc<dyn QueueTransport>,
    breaker: Arc<CircuitBreaker>,
    audit: Arc<dyn AuditStore>,
}

impl BatchPublisher {
    /// Create a new publisher
    ///
    /// # Errors
    /// If the configuration fails validation
    pub fn new(
        config: PublisherConfig,
        transport: Arc<dyn QueueTransport>,
        breaker: Arc<CircuitBreaker>,
        audit: Arc<dyn AuditStore>,
    ) -> Result<Self, PublishError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            breaker,
            audit,
        })
    }

    /// The publisher configuration
    #[must_use]
    pub const fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// The breaker guarding this publisher's downstream
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Publish a list of messages to the downstream queue
    ///
    /// Groups are processed in order, sequentially. Transient failures are
    /// retried per the retry policy without re-sending acknowledged entries;
    /// circuit-open rejections and exhausted retries become permanent
    /// failures. Every attempt is recorded in the audit store before this
    /// method returns; audit-append failures are logged and swallowed.
    ///
    /// A `Signal::Shutdown` on `cancel` aborts the current wait or call and
    /// yields a failure result counting everything still unsent.
    #[traced(instrument(level = tracing::Level::INFO, skip_all), timing(precision = "ms"))]
    pub async fn publish(
        &self,
        messages: Vec<MessageEntry>,
        trace_id: &TraceId,
        cancel: &mut broadcast::Receiver<Signal>,
    ) -> PublishResult {
        let started = Instant::now();
        let mut result = PublishResult::default();

        if messages.is_empty() {
            debug!(trace_id = %trace_id, "Nothing to publish");
            return result;
        }

        let total = messages.len();
        let groups = batch::partition(messages, self.config.group_size);
        info!(
            trace_id = %trace_id,
            queue = %self.config.target,
            items = total,
            groups = groups.len(),
            "Publishing batch"
        );

        let mut cancelled = false;
        for group in groups {
            if cancelled {
                for entry in group.into_entries() {
                    result.record_failed(FailedDelivery {
                        key: entry.record_key,
                        code: codes::CANCELLED.to_string(),
                        message: "publish cancelled before this group was attempted".to_string(),
                    });
                }
                continue;
            }
            cancelled = self
                .publish_group(group, trace_id, cancel, &mut result)
                .await;
        }

        let success = result.is_success();
        if success {
            audit::log_publish_success(
                trace_id.as_str(),
                &self.config.target,
                result.delivered_count(),
            );
        } else {
            audit::log_publish_failure(
                trace_id.as_str(),
                &self.config.target,
                result.failed_count(),
                result.total(),
                &result.summary(),
            );
        }

        let summary = if success {
            AuditRecord::success(OP_PUBLISH, result.total(), Some(trace_id.to_string()))
        } else {
            AuditRecord::failure(
                OP_PUBLISH,
                result.total(),
                result.summary(),
                Some(trace_id.to_string()),
            )
        };
        self.append_audit(summary).await;

        if let Some(metrics) = courier_metrics::try_metrics() {
            metrics.publish.record_publish(
                &self.config.target,
                started.elapsed().as_secs_f64(),
                success,
            );
        }

        result
    }

    /// Drive one delivery group to completion
    ///
    /// Returns `true` if the publish call was cancelled while this group was
    /// being processed.
    #[allow(
        clippy::too_many_lines,
        reason = "Audit bookkeeping adds necessary lines"
    )]
    async fn publish_group(
        &self,
        group: DeliveryGroup,
        trace_id: &TraceId,
        cancel: &mut broadcast::Receiver<Signal>,
        result: &mut PublishResult,
    ) -> bool {
        let group_total = group.len();
        let mut remaining = group.into_entries();
        let mut round: u32 = 0;
        let mut delivered_in_group: usize = 0;
        let mut permanent: Vec<FailedEntry> = Vec::new();
        let mut cancelled = false;
        let trace = Some(trace_id.to_string());

        loop {
            let attempted = remaining.len();

            let outcome = if self.breaker.try_acquire() {
                audit::log_publish_attempt(
                    trace_id.as_str(),
                    &self.config.target,
                    attempted,
                    round,
                );

                let completed = tokio::select! {
                    outcome = attempt::execute_attempt(
                        self.transport.as_ref(),
                        &self.config.target,
                        &remaining,
                    ) => Some(outcome),
                    () = shutdown_requested(cancel) => None,
                };
                let Some(outcome) = completed else {
                    warn!(trace_id = %trace_id, "Publish cancelled during transport call");
                    permanent = std::mem::take(&mut remaining)
                        .into_iter()
                        .map(|entry| {
                            FailedEntry::new(
                                entry,
                                codes::CANCELLED,
                                "publish cancelled during transport call",
                            )
                        })
                        .collect();
                    cancelled = true;
                    break;
                };

                self.breaker.record_outcome(outcome.call_succeeded());
                if let Some(metrics) = courier_metrics::try_metrics() {
                    metrics
                        .publish
                        .record_attempt(outcome.status(), &self.config.target);
                }
                outcome
            } else {
                audit::log_breaker_rejection(trace_id.as_str(), &self.config.target, attempted);
                if let Some(metrics) = courier_metrics::try_metrics() {
                    metrics.publish.record_breaker_rejection(&self.config.target);
                }
                AttemptOutcome::Rejected(std::mem::take(&mut remaining))
            };

            let attempt_record = match &outcome {
                AttemptOutcome::Delivered(_) => AuditRecord::success(OP_ATTEMPT, attempted, trace.clone()),
                AttemptOutcome::Partial { failed, .. } => AuditRecord::failure(
                    OP_ATTEMPT,
                    attempted,
                    format!("{} of {attempted} entries failed", failed.len()),
                    trace.clone(),
                ),
                AttemptOutcome::Failed(failed) => AuditRecord::failure(
                    OP_ATTEMPT,
                    attempted,
                    failed.first().map_or_else(
                        || "transport call failed".to_string(),
                        |failure| failure.message.clone(),
                    ),
                    trace.clone(),
                ),
                AttemptOutcome::Rejected(_) => AuditRecord::failure(
                    OP_ATTEMPT,
                    attempted,
                    "circuit breaker is open",
                    trace.clone(),
                ),
            };
            self.append_audit(attempt_record).await;

            let rejected = matches!(outcome, AttemptOutcome::Rejected(_));
            let (delivered, failed) = outcome.into_parts();
            delivered_in_group += delivered.len();
            for entry in delivered {
                result.record_delivered(entry.record_key);
            }

            if failed.is_empty() {
                break;
            }

            // Circuit-open entries fail immediately for this call; no retry
            // slot or backoff delay is consumed for them
            if rejected || !self.config.retry.should_retry(round) {
                permanent = failed;
                break;
            }

            let delay = self.config.retry.delay_for(round);
            info!(
                trace_id = %trace_id,
                round = round,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                remaining = failed.len(),
                "Scheduling retry with exponential backoff"
            );

            // One wait per round, regardless of how many entries remain
            let waited = tokio::select! {
                () = tokio::time::sleep(delay) => true,
                () = shutdown_requested(cancel) => false,
            };
            if !waited {
                warn!(trace_id = %trace_id, "Publish cancelled during retry backoff");
                permanent = failed
                    .into_iter()
                    .map(|failure| {
                        FailedEntry::new(
                            failure.entry,
                            codes::CANCELLED,
                            "publish cancelled during retry backoff",
                        )
                    })
                    .collect();
                cancelled = true;
                break;
            }

            round += 1;
            // Only the failed subset is resubmitted, each entry reissued with
            // a fresh attempt id
            remaining = failed
                .into_iter()
                .map(|failure| failure.entry.reissued())
                .collect();
        }

        let redact = audit::config().redact_payloads;
        for failure in &permanent {
            warn!(
                trace_id = %trace_id,
                record_key = %failure.entry.record_key,
                code = %failure.code,
                error = %failure.message,
                payload = %audit::redact_payload(&failure.entry.payload, redact),
                "Entry permanently failed"
            );
            self.append_audit(AuditRecord::failure(
                OP_PUBLISH,
                1,
                format!("{}: {}", failure.code, failure.message),
                trace.clone(),
            ))
            .await;
        }

        let group_record = if permanent.is_empty() {
            AuditRecord::success(OP_GROUP, delivered_in_group, trace.clone())
        } else {
            AuditRecord::failure(
                OP_GROUP,
                delivered_in_group,
                format!(
                    "{} of {group_total} entries permanently failed",
                    permanent.len()
                ),
                trace,
            )
        };
        self.append_audit(group_record).await;

        if let Some(metrics) = courier_metrics::try_metrics() {
            metrics
                .publish
                .record_retry_rounds(&self.config.target, u64::from(round));
            metrics.publish.record_delivered(
                &self.config.target,
                u64::try_from(delivered_in_group).unwrap_or(u64::MAX),
            );
            for failure in &permanent {
                metrics
                    .publish
                    .record_failed(&self.config.target, &failure.code, 1);
            }
        }

        for failure in permanent {
            result.record_failed(FailedDelivery::from(failure));
        }

        cancelled
    }

    /// Append an audit record, recovering locally from store failures
    ///
    /// Audit-append failures must never abort the publish flow.
    async fn append_audit(&self, record: AuditRecord) {
        if let Err(error) = self.audit.append(record).await {
            warn!(error = %error, "Failed to append audit record");
        }
    }
}

/// Resolve once a shutdown signal arrives on the cancellation channel
///
/// A closed channel means no sender exists anymore, so cancellation can never
/// fire; the future stays pending rather than treating closure as a signal.
async fn shutdown_requested(cancel: &mut broadcast::Receiver<Signal>) {
    loop {
        match cancel.recv().await {
            Ok(Signal::Shutdown) => return,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
            Err(broadcast::error::RecvError::Lagged(_)) => {}
        }
    }
}
