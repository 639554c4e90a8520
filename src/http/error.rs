//! Error types for HTTP plumbing.

use thiserror::Error;

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors from parsing or building HTTP messages.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Malformed request bytes.
    #[error("failed to parse request: {0}")]
    Parse(String),

    /// The request bytes end before the head is complete.
    #[error("incomplete request")]
    Incomplete,

    /// Invalid method or URI.
    #[error("invalid request line: {0}")]
    InvalidRequestLine(String),

    /// Body serialization failed.
    #[error("failed to encode body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<httparse::Error> for HttpError {
    fn from(err: httparse::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
