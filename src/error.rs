//! Error types shared across the client.
//!
//! ERROR HANDLING
//! ==============
//! Only a 401 is recovered locally (see `pipeline`). Every other HTTP failure
//! is surfaced unchanged as [`ApiError::Status`] so callers decide how to
//! present it. [`RefreshError`] is `Clone` because one refresh outcome is
//! delivered to every request queued behind it.

use reqwest::StatusCode;

/// Failure of a single token refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-success status.
    #[error("token refresh rejected with HTTP {status}")]
    Rejected { status: u16 },
    /// The refresh request never produced a response.
    #[error("token refresh transport failure: {0}")]
    Transport(String),
    /// The task leading the refresh went away before it settled.
    #[error("token refresh abandoned before completion")]
    Abandoned,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by the error, when the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("invalid websocket URL: {0}")]
    InvalidUrl(String),
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
