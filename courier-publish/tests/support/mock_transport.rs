//! Scripted transport for publish flow tests
//!
//! Behaviors are consumed call by call; once the script is exhausted the
//! fallback behavior applies. Every call is recorded for assertions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier_publish::{BatchFailure, BatchResponse, MessageEntry, QueueTransport, TransportError};

/// What the mock should do for one `send_batch` call
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Acknowledge every entry
    AckAll,
    /// Refuse entries whose record key matches, acknowledge the rest
    FailKeys(Vec<&'static str>),
    /// Fail the whole call
    Throw(&'static str),
}

/// Scripted in-memory transport
#[derive(Debug, Clone)]
pub struct MockTransport {
    script: Arc<Mutex<Vec<Behavior>>>,
    fallback: Behavior,
    calls: Arc<Mutex<Vec<Vec<MessageEntry>>>>,
}

impl MockTransport {
    /// Consume `script` front-first, then fall back to acknowledging everything
    pub fn scripted(script: Vec<Behavior>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            fallback: Behavior::AckAll,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Apply the same behavior to every call
    pub fn always(behavior: Behavior) -> Self {
        Self {
            script: Arc::new(Mutex::new(Vec::new())),
            fallback: behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Entries of every call made so far, in call order
    pub fn calls(&self) -> Vec<Vec<MessageEntry>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn next_behavior(&self) -> Behavior {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if script.is_empty() {
            self.fallback.clone()
        } else {
            script.remove(0)
        }
    }
}

#[async_trait]
impl QueueTransport for MockTransport {
    async fn send_batch(
        &self,
        _target: &str,
        entries: &[MessageEntry],
    ) -> Result<BatchResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(entries.to_vec());

        match self.next_behavior() {
            Behavior::AckAll => Ok(BatchResponse::ack_all(entries)),
            Behavior::FailKeys(keys) => {
                let mut response = BatchResponse::default();
                for entry in entries {
                    if keys.contains(&entry.record_key.as_str()) {
                        response.failed.push(BatchFailure {
                            id: entry.id.clone(),
                            code: "downstream-refused".to_string(),
                            message: "entry refused by test script".to_string(),
                        });
                    } else {
                        response.delivered.push(entry.id.clone());
                    }
                }
                Ok(response)
            }
            Behavior::Throw(message) => Err(TransportError::Unavailable(message.to_string())),
        }
    }
}
