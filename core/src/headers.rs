//! Default and authenticated header sets.
//!
//! Caller-supplied headers win over the fixed set. The token accessor is
//! only consulted when the caller did not bring its own `Authorization`.

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::http::Headers;

/// Product name sent in the `User-Agent` header.
pub const AGENT: &str = "LinkModule";
/// Version sent in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn user_agent() -> String {
    format!("{AGENT}/{VERSION}")
}

/// `extra` merged with `User-Agent`, `Accept` and a bearer `Authorization`.
pub fn default_headers(auth: &dyn AuthContext, extra: Headers) -> Result<Headers, ApiError> {
    let mut headers = extra;
    headers.insert_if_absent("User-Agent", user_agent());
    headers.insert_if_absent("Accept", "application/json");
    if !headers.contains("Authorization") {
        let token = auth.current_token()?;
        headers.insert("Authorization", format!("Bearer {token}"));
    }
    Ok(headers)
}

/// The default set with nothing extra.
pub fn authenticated_headers(auth: &dyn AuthContext) -> Result<Headers, ApiError> {
    default_headers(auth, Headers::new())
}
