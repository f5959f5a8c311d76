//! Typed error handling for the publish engine.
//!
//! Failure-handling policy operates on data, not unwinding: whole-call
//! transport errors are translated at the executor boundary into tagged
//! attempt outcomes, and only the aggregate `PublishResult` ever crosses the
//! coordinator's boundary. The types here cover the transport call itself and
//! publisher construction.

use thiserror::Error;

/// Whole-call transport failures.
///
/// Any of these means no entry in the attempt was acknowledged; the attempt
/// is recoverable and subject to the retry policy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The downstream rejected or aborted the call.
    #[error("Transport call failed: {0}")]
    Call(String),

    /// The downstream could not be reached.
    #[error("Downstream unavailable: {0}")]
    Unavailable(String),

    /// I/O error while talking to the downstream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Publisher construction and configuration errors.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Invalid publisher configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::Unavailable("connection refused".to_string());
        assert_eq!(
            error.to_string(),
            "Downstream unavailable: connection refused"
        );

        let io = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        assert!(io.to_string().contains("timed out"));
    }
}
