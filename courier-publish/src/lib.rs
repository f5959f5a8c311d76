//! Resilient batch delivery engine for the courier relay
//!
//! This crate takes a list of ready-to-send messages and delivers them to a
//! downstream queue under partial failure:
//! - transient failures are retried without re-sending acknowledged entries
//! - a sustained failure condition trips a circuit breaker that stops
//!   wasting calls on a failing downstream
//! - every delivery attempt is durably recorded for audit before the engine
//!   returns
//!
//! The engine accepts at-least-once delivery (idempotent consumers are
//! assumed downstream) and makes no ordering promises across batches.

pub mod attempt;
pub mod batch;
mod circuit_breaker;
mod config;
mod error;
pub mod policy;
mod publisher;
pub mod transport;
mod types;

pub use attempt::AttemptOutcome;
pub use batch::{MAX_GROUP_SIZE, partition};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use config::PublisherConfig;
pub use error::{PublishError, TransportError};
pub use policy::RetryPolicy;
pub use publisher::BatchPublisher;
pub use transport::{BatchFailure, BatchResponse, LoopbackTransport, QueueTransport};
pub use types::{
    DeliveryGroup, EntryId, FailedDelivery, FailedEntry, MessageEntry, PublishResult, codes,
};
