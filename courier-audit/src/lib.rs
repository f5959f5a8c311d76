//! Audit record store for the courier relay
//!
//! Every delivery attempt, permanent failure, and batch summary produced by
//! the publish engine is appended here before the engine returns. The store
//! is append-only from the engine's point of view: rows are never read back
//! or updated by the publish path.

pub mod backends;
pub mod error;
pub mod record;
pub mod store;

pub use backends::{FileAuditStore, MemoryAuditStore};
pub use error::{AuditError, Result};
pub use record::{AuditRecord, AuditRecordId};
pub use store::AuditStore;
