//! Error types for kbdesk.

use thiserror::Error;

/// Result type alias using kbdesk's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kbdesk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote API answered with a non-success status.
    ///
    /// `message` is the server-provided message, or the per-operation
    /// fallback when the payload carried none.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP/network request failed before a response arrived
    #[error("Request error: {0}")]
    Request(String),

    /// Request exceeded its time budget (seconds)
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with one already in progress
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message suitable for a user-facing banner.
    ///
    /// API errors surface the server's own message verbatim; everything else
    /// uses its display form.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the failure came from the transport rather than the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Timeout(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(crate::defaults::REQUEST_TIMEOUT_SECS)
        } else if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
