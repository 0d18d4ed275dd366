//! Failure kinds surfaced by the dial workflow

use thiserror::Error;

/// Every way a status check or call initiation can fail.
///
/// None of these are fatal: the workflow reports them and stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialError {
    /// Endpoint settings are missing or unusable. No request is attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input contained no dialable digits.
    #[error("invalid number")]
    InvalidNumber,

    /// The request never produced an HTTP response.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The endpoint answered with a non-2xx status.
    #[error("Request failed with status {code}: {reason}")]
    Status { code: u16, reason: String },
}

impl DialError {
    /// Build a `Status` error, using the canonical reason phrase when known.
    pub fn status(code: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown status")
            .to_string();
        Self::Status { code, reason }
    }
}

/// True for status codes in `[200, 300)`.
pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}
