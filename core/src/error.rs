//! Error types for the Link Module API client.
//!
//! # Design
//! `TransportError` is what a `Transport` reports; `ApiError` is what callers
//! of `ApiRequestor` see. Only 4xx `TransportError::Status` values are routed
//! to an `ErrorTranslator`, which turns them into one of the domain variants
//! below. Every other transport failure is wrapped in `ApiError::Transport`
//! untouched.

use thiserror::Error;

use crate::http::JsonMap;

/// Failures reported by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout")]
    Timeout,

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Status code for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 400–499 statuses; these are the only errors the requestor
    /// hands to its translator.
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

/// Errors returned by `ApiRequestor`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token accessor has no token to return.
    #[error("no API token configured")]
    MissingToken,

    /// No transport was ever installed.
    #[error("no HTTP transport configured")]
    NotConfigured,

    /// A transport failure other than a 4xx response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful response whose body is not the expected JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("unauthenticated: {message}")]
    Unauthenticated { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    /// 422 with per-field messages from the server.
    #[error("validation failed: {message}")]
    Validation { message: String, errors: JsonMap },

    /// Any other 4xx status.
    #[error("client error ({status}): {message}")]
    ClientRequest { status: u16, message: String },
}

impl ApiError {
    /// HTTP status behind this error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(err) => err.status(),
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthenticated { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(422),
            ApiError::ClientRequest { status, .. } => Some(*status),
            ApiError::MissingToken | ApiError::NotConfigured | ApiError::Decode(_) => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
