//! Mapping of HTTP failures onto [`kbdesk_core::Error`].

use kbdesk_core::Error;

use crate::types::ErrorBody;

/// Resolve the message for a non-success response body.
///
/// The store's `{"error": "..."}` message wins; an empty, missing, or
/// unparseable body degrades to `fallback`.
pub fn error_message(body: &[u8], fallback: &str) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Build the error for a non-success status.
pub fn status_error(status: u16, body: &[u8], fallback: &str) -> Error {
    Error::Api {
        status,
        message: error_message(body, fallback),
    }
}

/// Map a transport failure, keeping the configured timeout in the error.
pub fn transport_error(err: reqwest::Error, timeout_secs: u64) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout_secs)
    } else {
        Error::from(err)
    }
}
