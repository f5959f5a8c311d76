//! Structured audit events for the publish lifecycle
//!
//! Durable audit rows live in the audit store; this module mirrors the same
//! lifecycle events to the log stream as structured JSON-friendly
//! `tracing::event!` records, with configurable payload redaction.
//!
//! ## Audit Events
//!
//! - `PublishAttempt`: one transport call against a delivery group
//! - `PublishSuccess`: a relay invocation completed with zero permanent failures
//! - `PublishFailure`: entries permanently failed after exhausting retries
//! - `BreakerRejection`: an attempt was refused because the circuit was open

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Audit event logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging for publish lifecycle events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Redact message payload previews from audit logs
    #[serde(default = "default_true")]
    pub redact_payloads: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_payloads: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Global audit configuration (thread-safe)
static AUDIT_CONFIG: std::sync::OnceLock<Arc<AuditConfig>> = std::sync::OnceLock::new();

/// Initialize audit logging with configuration
pub fn init(config: AuditConfig) {
    AUDIT_CONFIG.get_or_init(|| Arc::new(config));
}

/// Get the current audit configuration
#[must_use]
pub fn config() -> Arc<AuditConfig> {
    AUDIT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(AuditConfig::default()))
}

/// Redact a payload preview if redaction is enabled
#[must_use]
pub fn redact_payload(payload: &str, redact: bool) -> String {
    if redact {
        format!("[REDACTED {} bytes]", payload.len())
    } else {
        payload.to_string()
    }
}

/// Log a publish attempt event
///
/// Logged for each transport call against a delivery group.
///
/// # Fields
/// - `trace_id`: relay invocation correlation id
/// - `target`: downstream queue identifier
/// - `items`: number of entries in the attempted group
/// - `round`: retry round (0 = initial attempt)
pub fn log_publish_attempt(trace_id: &str, target: &str, items: usize, round: u32) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "PublishAttempt",
        trace_id = %trace_id,
        queue = %target,
        items = items,
        round = round,
        "Audit: Publish attempt"
    );
}

/// Log a publish success event
///
/// Logged when a relay invocation finishes with zero permanent failures.
pub fn log_publish_success(trace_id: &str, target: &str, items: usize) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "PublishSuccess",
        trace_id = %trace_id,
        queue = %target,
        items = items,
        "Audit: Publish successful"
    );
}

/// Log a publish failure event
///
/// Logged when entries permanently fail after exhausting retry rounds or
/// because the breaker rejected them.
pub fn log_publish_failure(trace_id: &str, target: &str, failed: usize, total: usize, error: &str) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "PublishFailure",
        trace_id = %trace_id,
        queue = %target,
        failed = failed,
        total = total,
        error = %error,
        "Audit: Publish failed"
    );
}

/// Log a breaker rejection event
///
/// Logged when the circuit breaker refuses an attempt before any transport
/// call is made.
pub fn log_breaker_rejection(trace_id: &str, target: &str, items: usize) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "BreakerRejection",
        trace_id = %trace_id,
        queue = %target,
        items = items,
        "Audit: Attempt rejected, circuit open"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_payload() {
        assert_eq!(
            redact_payload("{\"k\":\"v\"}", true),
            "[REDACTED 9 bytes]"
        );
        assert_eq!(redact_payload("{\"k\":\"v\"}", false), "{\"k\":\"v\"}");
    }

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert!(config.enabled);
        assert!(config.redact_payloads);
    }

    #[test]
    fn test_audit_disabled() {
        // Initialize with disabled config
        init(AuditConfig {
            enabled: false,
            redact_payloads: false,
        });

        // These should not panic even when disabled
        log_publish_attempt("trace-1", "outbound", 10, 0);
        log_publish_success("trace-1", "outbound", 10);
        log_publish_failure("trace-1", "outbound", 3, 10, "downstream unavailable");
        log_breaker_rejection("trace-1", "outbound", 10);
    }
}
