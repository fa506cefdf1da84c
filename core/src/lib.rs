//! Authenticated JSON client core for the Link Module API.
//!
//! # Overview
//! `ApiRequestor` issues GET/POST/PATCH/DELETE requests through a pluggable
//! `Transport`, attaching `User-Agent`, `Accept` and bearer `Authorization`
//! headers, and decodes JSON response bodies into maps (or any
//! `DeserializeOwned` type through the `*_as` variants).
//!
//! # Design
//! - The transport is injected and replaceable (`set_transport`); tests swap
//!   in stubs, production uses `UreqTransport`.
//! - The token and TLS policy come from an `AuthContext` read on every call,
//!   never cached.
//! - 4xx responses are handed to an `ErrorTranslator`; everything else the
//!   transport reports propagates as `ApiError::Transport`.

pub mod auth;
pub mod error;
pub mod headers;
pub mod http;
pub mod requestor;
pub mod translate;
pub mod transport;
#[cfg(feature = "ureq")]
pub mod ureq_transport;

pub use auth::{AuthContext, Credentials};
pub use error::{ApiError, TransportError};
pub use headers::{AGENT, VERSION};
pub use http::{Headers, HttpMethod, HttpResponse, JsonMap, RequestBody, RequestOptions};
pub use requestor::ApiRequestor;
pub use translate::{ClientError, ErrorTranslator, StatusErrorTranslator};
pub use transport::{Transport, TransportHolder};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
