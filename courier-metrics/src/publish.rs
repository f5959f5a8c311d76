//! Publish path metrics
//!
//! Tracks the batch delivery engine:
//! - Attempts by status (delivered/partial/failed/rejected)
//! - Entries delivered and permanently failed
//! - Retry rounds spent per group
//! - Breaker rejections
//! - End-to-end publish durations

use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

use crate::MetricsError;

/// Publish metrics collector
#[derive(Debug)]
pub struct PublishMetrics {
    /// Total number of delivery attempts by status
    attempts_total: Counter<u64>,

    /// Total number of entries acknowledged by the downstream
    entries_delivered: Counter<u64>,

    /// Total number of entries permanently failed
    entries_failed: Counter<u64>,

    /// Distribution of retry rounds spent per delivery group
    retry_rounds: Histogram<u64>,

    /// Total number of attempts rejected by the circuit breaker
    breaker_rejections: Counter<u64>,

    /// Distribution of end-to-end publish call durations
    publish_duration_seconds: Histogram<f64>,
}

impl PublishMetrics {
    /// Create a new publish metrics collector
    ///
    /// # Errors
    ///
    /// Returns an error if metric instruments cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let meter = meter();

        let attempts_total = meter
            .u64_counter("courier.publish.attempts.total")
            .with_description("Total number of delivery attempts by status")
            .build();

        let entries_delivered = meter
            .u64_counter("courier.publish.entries.delivered.total")
            .with_description("Total number of entries acknowledged by the downstream")
            .build();

        let entries_failed = meter
            .u64_counter("courier.publish.entries.failed.total")
            .with_description("Total number of entries permanently failed")
            .build();

        let retry_rounds = meter
            .u64_histogram("courier.publish.retry.rounds")
            .with_description("Distribution of retry rounds spent per delivery group")
            .build();

        let breaker_rejections = meter
            .u64_counter("courier.publish.breaker.rejections.total")
            .with_description("Total number of attempts rejected by the circuit breaker")
            .build();

        let publish_duration_seconds = meter
            .f64_histogram("courier.publish.duration.seconds")
            .with_description("Distribution of end-to-end publish call durations")
            .build();

        Ok(Self {
            attempts_total,
            entries_delivered,
            entries_failed,
            retry_rounds,
            breaker_rejections,
            publish_duration_seconds,
        })
    }

    /// Record a delivery attempt
    pub fn record_attempt(&self, status: &str, target: &str) {
        let attributes = [
            KeyValue::new("status", status.to_string()),
            KeyValue::new("target", target.to_string()),
        ];
        self.attempts_total.add(1, &attributes);
    }

    /// Record entries acknowledged by the downstream
    pub fn record_delivered(&self, target: &str, count: u64) {
        let attributes = [KeyValue::new("target", target.to_string())];
        self.entries_delivered.add(count, &attributes);
    }

    /// Record entries permanently failed
    pub fn record_failed(&self, target: &str, reason: &str, count: u64) {
        let attributes = [
            KeyValue::new("target", target.to_string()),
            KeyValue::new("reason", reason.to_string()),
        ];
        self.entries_failed.add(count, &attributes);
    }

    /// Record the retry rounds a group consumed before settling
    pub fn record_retry_rounds(&self, target: &str, rounds: u64) {
        let attributes = [KeyValue::new("target", target.to_string())];
        self.retry_rounds.record(rounds, &attributes);
    }

    /// Record a circuit breaker rejection
    pub fn record_breaker_rejection(&self, target: &str) {
        let attributes = [KeyValue::new("target", target.to_string())];
        self.breaker_rejections.add(1, &attributes);
        self.record_attempt("rejected", target);
    }

    /// Record an end-to-end publish call
    pub fn record_publish(&self, target: &str, duration_secs: f64, success: bool) {
        let attributes = [
            KeyValue::new("target", target.to_string()),
            KeyValue::new("success", success),
        ];
        self.publish_duration_seconds
            .record(duration_secs, &attributes);
    }
}

/// Get the OpenTelemetry meter for publish metrics
fn meter() -> Meter {
    opentelemetry::global::meter("courier.publish")
}
