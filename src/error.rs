//! Error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures while turning an inbound request into an event.
#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("failed to parse JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ReceiveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiveError::BodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ReceiveError::InvalidJson(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Fixed client-facing text; the cause is only logged.
    fn public_message(&self) -> &'static str {
        match self {
            ReceiveError::BodyRead(_) => "Internal Server Error\n",
            ReceiveError::InvalidJson(_) => "Invalid JSON body\n",
        }
    }
}

impl IntoResponse for ReceiveError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}

/// Failures talking to the push API.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("push API returned {status}: {}", .errors.join(", "))]
    Rejected {
        status: u16,
        errors: Vec<String>,
        request_id: Option<String>,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing Pushover credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
