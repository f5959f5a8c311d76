//! Shared types and logging for the courier relay.

pub mod audit;
pub mod logging;
pub mod types;

pub use tracing;
pub use types::{RecordKey, TraceId};

/// Control signal broadcast to long-running operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Stop work as soon as the current suspension point is reached.
    Shutdown,
}
