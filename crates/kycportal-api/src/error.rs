//! Error types for backend calls.

use serde::Deserialize;
use thiserror::Error;

/// Message used when the backend gives no usable error text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Server { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Error body shape used by the backend: `{ "error": "..." }`, sometimes
/// `{ "detail": ... }` instead.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Build a server error from a non-2xx response body.
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| {
                let error = b.error.filter(|e| !e.trim().is_empty());
                error.or_else(|| match b.detail? {
                    serde_json::Value::String(s) => Some(s).filter(|s| !s.trim().is_empty()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
            });
        ApiError::Server { status, message }
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Best message to show an operator: the server's own text when present,
    /// else `fallback` for server errors, else the transport error.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Server { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}
