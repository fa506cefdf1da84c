//! Authenticated JSON requestor for the Link Module API.
//!
//! # Design
//! `ApiRequestor` shapes one `RequestOptions` per verb, hands it to the
//! installed `Transport`, and decodes the JSON body. Which header set a verb
//! gets depends on whether the caller passed headers:
//!
//! | verb   | headers given             | no headers                | params       |
//! |--------|---------------------------|---------------------------|--------------|
//! | GET    | `default_headers(given)`  | `authenticated_headers()` | query string |
//! | POST   | `default_headers(given)`  | `default_headers({})`     | JSON body    |
//! | PATCH  | `default_headers(given)`  | `authenticated_headers()` | JSON body    |
//! | DELETE | `default_headers(given)`  | `authenticated_headers()` | query string |
//!
//! Only 4xx responses are intercepted; they go to the `ErrorTranslator`.
//! Everything else the transport reports is returned as `ApiError::Transport`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::error::{ApiError, TransportError};
use crate::headers;
use crate::http::{Headers, HttpMethod, JsonMap, RequestBody, RequestOptions};
use crate::translate::{ClientError, ErrorTranslator, StatusErrorTranslator};
use crate::transport::{Transport, TransportHolder};

/// Which header set a verb falls back to when the caller passes none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderSource {
    /// `default_headers(given)` when headers are given, else `authenticated_headers()`.
    Conditional,
    /// Always `default_headers(given or empty)`.
    AlwaysDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Query,
    Json,
}

#[derive(Clone)]
pub struct ApiRequestor {
    transport: TransportHolder,
    auth: Arc<dyn AuthContext>,
    translator: Arc<dyn ErrorTranslator>,
}

impl std::fmt::Debug for ApiRequestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequestor")
            .field("transport", &self.transport)
            .field("translator", &self.translator)
            .finish()
    }
}

impl ApiRequestor {
    pub fn new(transport: Arc<dyn Transport>, auth: Arc<dyn AuthContext>) -> Self {
        Self {
            transport: TransportHolder::new(transport),
            auth,
            translator: Arc::new(StatusErrorTranslator),
        }
    }

    /// A requestor with no transport; calls fail with `NotConfigured` until
    /// `set_transport` is used.
    pub fn unconfigured(auth: Arc<dyn AuthContext>) -> Self {
        Self {
            transport: TransportHolder::default(),
            auth,
            translator: Arc::new(StatusErrorTranslator),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn ErrorTranslator>) -> Self {
        self.translator = translator;
        self
    }

    /// Replace the transport for this requestor and every clone of it.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        self.transport.set(transport);
    }

    pub fn transport(&self) -> Result<Arc<dyn Transport>, ApiError> {
        self.transport.get()
    }

    pub fn default_headers(&self, extra: Headers) -> Result<Headers, ApiError> {
        headers::default_headers(self.auth.as_ref(), extra)
    }

    pub fn authenticated_headers(&self) -> Result<Headers, ApiError> {
        headers::authenticated_headers(self.auth.as_ref())
    }

    pub fn get(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<JsonMap>, ApiError> {
        self.get_as(uri, params, headers)
    }

    pub fn post(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<JsonMap>, ApiError> {
        self.post_as(uri, params, headers)
    }

    pub fn patch(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<JsonMap>, ApiError> {
        self.patch_as(uri, params, headers)
    }

    pub fn delete(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<JsonMap>, ApiError> {
        self.delete_as(uri, params, headers)
    }

    pub fn get_as<T: DeserializeOwned>(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<T>, ApiError> {
        let options = self.options(HeaderSource::Conditional, Placement::Query, params, headers)?;
        self.dispatch_as(HttpMethod::Get, uri, &options)
    }

    pub fn post_as<T: DeserializeOwned>(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<T>, ApiError> {
        let options = self.options(
            HeaderSource::AlwaysDefault,
            Placement::Json,
            params,
            headers,
        )?;
        self.dispatch_as(HttpMethod::Post, uri, &options)
    }

    pub fn patch_as<T: DeserializeOwned>(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<T>, ApiError> {
        let options = self.options(HeaderSource::Conditional, Placement::Json, params, headers)?;
        self.dispatch_as(HttpMethod::Patch, uri, &options)
    }

    pub fn delete_as<T: DeserializeOwned>(
        &self,
        uri: &str,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<Option<T>, ApiError> {
        let options = self.options(HeaderSource::Conditional, Placement::Query, params, headers)?;
        self.dispatch_as(HttpMethod::Delete, uri, &options)
    }

    /// Execute a request and decode its body as a JSON object.
    pub fn dispatch(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<Option<JsonMap>, ApiError> {
        self.dispatch_as(method, uri, options)
    }

    /// Execute a request and decode its body as `T`.
    ///
    /// Returns `Ok(None)` only when a 4xx response was handed to a translator
    /// that chose not to raise. Decode errors name the response content type.
    pub fn dispatch_as<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let transport = self.transport()?;
        debug!(%method, uri, verify_tls = options.verify_tls, "dispatching request");

        match transport.execute(method, uri, options) {
            Ok(response) => {
                let decoded = serde_json::from_str(&response.body).map_err(|err| {
                    ApiError::Decode(format!(
                        "{err} (content-type: {})",
                        response.content_type().unwrap_or("none")
                    ))
                })?;
                debug!(%method, uri, status = response.status, "decoded response");
                Ok(Some(decoded))
            }
            Err(TransportError::Status { status, body }) if (400..500).contains(&status) => {
                warn!(%method, uri, status, "client error, handing to translator");
                self.translator.handle(ClientError {
                    method,
                    uri: uri.to_string(),
                    status,
                    body,
                })?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn options(
        &self,
        source: HeaderSource,
        placement: Placement,
        params: &JsonMap,
        headers: Option<Headers>,
    ) -> Result<RequestOptions, ApiError> {
        let headers = match (source, headers) {
            (_, Some(given)) => self.default_headers(given)?,
            (HeaderSource::Conditional, None) => self.authenticated_headers()?,
            (HeaderSource::AlwaysDefault, None) => self.default_headers(Headers::new())?,
        };
        let body = match placement {
            Placement::Query => RequestBody::Query(params.clone()),
            Placement::Json => RequestBody::Json(params.clone()),
        };
        Ok(RequestOptions {
            headers,
            body,
            verify_tls: self.auth.verify_tls(),
        })
    }
}
