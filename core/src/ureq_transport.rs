//! Blocking `Transport` backed by `ureq`.
//!
//! # Design
//! Two agents are built up front, one verifying certificates and one not, and
//! each request picks one by `RequestOptions::verify_tls`. Status-as-error is
//! disabled on both so the response body of a failed call is still read and
//! handed back in `TransportError::Status`.

use std::io;

use tracing::trace;
use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::error::TransportError;
use crate::http::{query_pairs, HttpMethod, HttpResponse, RequestBody, RequestOptions};
use crate::transport::Transport;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "LINK_MODULE_BASE_URL";

pub struct UreqTransport {
    base_url: Option<String>,
    verifying: Agent,
    insecure: Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::build(None)
    }
}

impl UreqTransport {
    /// Relative URIs are resolved against `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::build(Some(base_url.trim_end_matches('/').to_string()))
    }

    /// Read the base URL from `LINK_MODULE_BASE_URL`, if set.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::new(&url),
            _ => Self::default(),
        }
    }

    fn build(base_url: Option<String>) -> Self {
        let verifying = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        let insecure = Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(TlsConfig::builder().disable_verification(true).build())
            .build()
            .new_agent();
        Self {
            base_url,
            verifying,
            insecure,
        }
    }

    fn agent(&self, verify_tls: bool) -> &Agent {
        if verify_tls {
            &self.verifying
        } else {
            &self.insecure
        }
    }

    fn resolve(&self, uri: &str) -> String {
        match &self.base_url {
            Some(base) if !uri.starts_with("http://") && !uri.starts_with("https://") => {
                format!("{base}/{}", uri.trim_start_matches('/'))
            }
            _ => uri.to_string(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.resolve(uri);
        let agent = self.agent(options.verify_tls);
        trace!(%method, %url, "sending request");

        let result = match (&options.body, method) {
            (RequestBody::Query(params), HttpMethod::Get) => {
                decorate(agent.get(&url), options)
                    .query_pairs(query_pairs(params))
                    .call()
            }
            (RequestBody::Query(params), HttpMethod::Delete) => {
                decorate(agent.delete(&url), options)
                    .query_pairs(query_pairs(params))
                    .call()
            }
            (RequestBody::Json(params), HttpMethod::Post) => {
                let body = encode(params)?;
                decorate(agent.post(&url), options)
                    .content_type("application/json")
                    .send(&body[..])
            }
            (RequestBody::Json(params), HttpMethod::Patch) => {
                let body = encode(params)?;
                decorate(agent.patch(&url), options)
                    .content_type("application/json")
                    .send(&body[..])
            }
            (body, method) => {
                let kind = match body {
                    RequestBody::Query(_) => "query params",
                    RequestBody::Json(_) => "a JSON body",
                };
                return Err(TransportError::Other(format!("{method} does not accept {kind}")));
            }
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(map_error)?;

        HttpResponse {
            status,
            headers,
            body,
        }
        .error_for_status()
    }
}

fn decorate<B>(
    mut builder: ureq::RequestBuilder<B>,
    options: &RequestOptions,
) -> ureq::RequestBuilder<B> {
    for (name, value) in options.headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn encode(params: &crate::http::JsonMap) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(params).map_err(|e| TransportError::Other(e.to_string()))
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::BadUri(uri) => TransportError::InvalidUri(uri),
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => TransportError::Timeout,
        ureq::Error::Io(e) => TransportError::Connection(e.to_string()),
        e @ (ureq::Error::HostNotFound | ureq::Error::ConnectionFailed) => {
            TransportError::Connection(e.to_string())
        }
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn relative_uris_join_the_base_url() {
        let transport = UreqTransport::new("http://localhost:3000/");
        assert_eq!(transport.resolve("/links"), "http://localhost:3000/links");
        assert_eq!(
            transport.resolve("links/1"),
            "http://localhost:3000/links/1"
        );
    }

    #[test]
    fn absolute_uris_are_left_alone() {
        let transport = UreqTransport::new("http://localhost:3000");
        assert_eq!(
            transport.resolve("https://example.com/x"),
            "https://example.com/x"
        );
    }

    #[test]
    fn no_base_url_passes_uri_through() {
        let transport = UreqTransport::default();
        assert_eq!(transport.resolve("/links"), "/links");
    }

    #[test]
    fn timeouts_map_to_timeout() {
        let slow = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert!(matches!(
            map_error(ureq::Error::Io(slow)),
            TransportError::Timeout
        ));
    }

    #[test]
    fn host_not_found_is_a_connection_error() {
        assert!(matches!(
            map_error(ureq::Error::HostNotFound),
            TransportError::Connection(_)
        ));
    }

    #[test]
    fn verify_tls_picks_the_agent() {
        let transport = UreqTransport::default();
        assert!(std::ptr::eq(transport.agent(true), &transport.verifying));
        assert!(std::ptr::eq(transport.agent(false), &transport.insecure));
        assert!(!std::ptr::eq(transport.agent(false), &transport.verifying));
    }

    #[test]
    fn from_env_reads_the_base_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        std::env::set_var(BASE_URL_ENV, "http://api.example.test/");
        let transport = UreqTransport::from_env();
        assert_eq!(
            transport.base_url.as_deref(),
            Some("http://api.example.test")
        );
        assert_eq!(transport.resolve("/links"), "http://api.example.test/links");

        std::env::set_var(BASE_URL_ENV, "");
        assert_eq!(UreqTransport::from_env().base_url, None);

        std::env::remove_var(BASE_URL_ENV);
        assert_eq!(UreqTransport::from_env().base_url, None);
    }
}
