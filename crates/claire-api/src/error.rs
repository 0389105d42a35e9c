//! Error types for claire-api

use thiserror::Error;

/// Result type alias using claire-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the assistant service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with a non-success status code
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Payload was well-formed JSON but not what we expected
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from a code and response body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether the request never reached the service (connect/timeout/etc.)
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// The HTTP status code, if the service answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
