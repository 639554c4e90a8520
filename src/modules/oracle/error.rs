//! Error types for abuse-oracle integration.

use std::time::Duration;
use thiserror::Error;

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors from querying the abuse-detection service.
#[derive(Debug, Error)]
pub enum OracleError {
    /// No credential configured for the remote service.
    #[error("no oracle credential configured")]
    MissingCredential,

    /// The configured endpoint is not a valid URI.
    #[error("invalid oracle endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Connection or protocol failure talking to the service.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("oracle returned status {0}")]
    Status(u16),

    /// The service answered with a body we could not interpret.
    #[error("malformed oracle response: {0}")]
    InvalidPayload(String),

    /// The evaluation did not finish within the configured bound.
    #[error("oracle evaluation timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    /// Whether the error is a transient availability problem rather than
    /// a deployment mistake.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status(_) | Self::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = OracleError::Status(502);
        assert_eq!(err.to_string(), "oracle returned status 502");

        let err = OracleError::MissingCredential;
        assert_eq!(err.to_string(), "no oracle credential configured");
    }

    #[test]
    fn test_is_transient() {
        assert!(OracleError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(OracleError::Transport("refused".to_string()).is_transient());
        assert!(!OracleError::MissingCredential.is_transient());
        assert!(!OracleError::InvalidEndpoint("x".to_string()).is_transient());
    }
}
