//! Error types for the courier-audit crate.

use std::io;

use thiserror::Error;

/// Top-level audit store error type.
#[derive(Debug, Error)]
pub enum AuditError {
    /// I/O operation failed (file append, directory creation).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store path validation failed.
    #[error("Audit store validation error: {0}")]
    Validation(String),

    /// Internal error (lock poisoning, capacity).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for audit store operations.
pub type Result<T> = std::result::Result<T, AuditError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for AuditError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let audit_err: AuditError = io_err.into();
        assert!(matches!(audit_err, AuditError::Io(_)));
        assert!(audit_err.to_string().contains("file not found"));
    }
}
