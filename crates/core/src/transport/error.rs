//! Transport error type.

use thiserror::Error;

/// Errors surfaced by backend and storage calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx response. `detail` is the backend's structured error detail,
    /// when the body carried one.
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        detail: Option<String>,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other client-side failure; carries the raw message only.
    #[error("{0}")]
    Request(String),
}

impl ApiError {
    /// Build a status error from a response body.
    pub fn from_status(status: u16, body: String) -> Self {
        Self::Status {
            status,
            detail: extract_detail(&body),
            body,
        }
    }

    /// HTTP status, for status errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured error detail from the response body, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// True for 401 and 403 responses.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if e.is_builder() {
            ApiError::InvalidUrl(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

/// Pull the `detail` field out of a JSON error body.
///
/// String details are returned verbatim; structured ones (validation error
/// lists) as their JSON text.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
