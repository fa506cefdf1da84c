//! Token and TLS policy accessors consulted on every request.
//!
//! # Design
//! The requestor never stores a token. It asks an `AuthContext` for the
//! current bearer token and the TLS verification flag each time it builds a
//! request, so rotating either through `Credentials` takes effect on the next
//! call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::ApiError;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "LINK_MODULE_TOKEN";
/// Environment variable controlling TLS certificate verification.
pub const VERIFY_SSL_ENV: &str = "LINK_MODULE_VERIFY_SSL";

/// Source of the bearer token and TLS verification policy.
pub trait AuthContext: Send + Sync {
    /// The token to send right now. Fails with `ApiError::MissingToken` when
    /// none is available.
    fn current_token(&self) -> Result<String, ApiError>;

    fn verify_tls(&self) -> bool;
}

/// Runtime-mutable credentials.
#[derive(Debug)]
pub struct Credentials {
    token: RwLock<Option<String>>,
    verify_tls: AtomicBool,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            token: RwLock::new(None),
            verify_tls: AtomicBool::new(true),
        }
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        let credentials = Self::default();
        credentials.set_token(token);
        credentials
    }

    /// Read `LINK_MODULE_TOKEN` and `LINK_MODULE_VERIFY_SSL`.
    pub fn from_env() -> Self {
        let credentials = Self::default();
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                credentials.set_token(token);
            }
        }
        if let Ok(flag) = std::env::var(VERIFY_SSL_ENV) {
            credentials.set_verify_tls(parse_flag(&flag));
        }
        credentials
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn set_verify_tls(&self, verify: bool) {
        self.verify_tls.store(verify, Ordering::SeqCst);
    }
}

impl AuthContext for Credentials {
    fn current_token(&self) -> Result<String, ApiError> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ApiError::MissingToken)
    }

    fn verify_tls(&self) -> bool {
        self.verify_tls.load(Ordering::SeqCst)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
