//! Upstream ingestion for the courier relay
//!
//! This crate covers the deterministic front half of the relay:
//! - fetching candidate records from the upstream source
//! - validating them field by field
//! - reshaping valid records into canonical outbound messages

pub mod canonical;
pub mod error;
pub mod record;
pub mod source;

pub use canonical::{CanonicalMessage, MAX_KEY_LENGTH, canonicalize};
pub use error::{IngestError, SourceError, ValidationError};
pub use record::CandidateRecord;
pub use source::{MemoryRecordSource, RecordSource};
