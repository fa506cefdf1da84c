//! Translation of 4xx responses into domain errors.

use std::fmt::Debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, JsonMap};

/// A 4xx response, with enough context to describe the failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub method: HttpMethod,
    pub uri: String,
    pub status: u16,
    pub body: String,
}

impl ClientError {
    /// The `message` field of a JSON body, or the raw body otherwise.
    pub fn message(&self) -> String {
        serde_json::from_str::<JsonMap>(&self.body)
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.body.clone())
    }

    /// The `errors` object of a JSON body, empty when absent.
    pub fn field_errors(&self) -> JsonMap {
        serde_json::from_str::<JsonMap>(&self.body)
            .ok()
            .and_then(|mut body| match body.remove("errors") {
                Some(serde_json::Value::Object(errors)) => Some(errors),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Receives every 4xx response the requestor sees.
///
/// Returning `Err` raises that error to the caller. Returning `Ok(())`
/// swallows the failure and the request yields no body.
pub trait ErrorTranslator: Send + Sync + Debug {
    fn handle(&self, error: ClientError) -> Result<(), ApiError>;
}

/// Maps well-known statuses to `ApiError` variants. Never returns `Ok`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusErrorTranslator;

impl ErrorTranslator for StatusErrorTranslator {
    fn handle(&self, error: ClientError) -> Result<(), ApiError> {
        let message = error.message();
        Err(match error.status {
            400 => ApiError::BadRequest { message },
            401 => ApiError::Unauthenticated { message },
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound { message },
            422 => ApiError::Validation {
                message,
                errors: error.field_errors(),
            },
            status => ApiError::ClientRequest { status, message },
        })
    }
}
