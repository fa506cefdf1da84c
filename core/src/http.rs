//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. The requestor shapes a
//! `RequestOptions` value per verb and hands it to whatever `Transport` is
//! installed; the transport returns an `HttpResponse` (or a `TransportError`
//! for non-2xx statuses). Nothing here touches the network.
//!
//! Header names compare case-insensitively but keep their insertion order and
//! original spelling, so a request built here reads the same way on the wire.

use std::fmt;

use crate::error::TransportError;

/// Generic JSON object used for request params and decoded response bodies.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Value of the first header named `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name`, replacing any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    /// Set `name` only when no entry with that name exists yet.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.0.push((name, value.into()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Headers {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Where the caller's params travel. A request carries exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Encoded into the query string (GET, DELETE).
    Query(JsonMap),
    /// Sent as a JSON body (POST, PATCH).
    Json(JsonMap),
}

impl RequestBody {
    pub fn query(&self) -> Option<&JsonMap> {
        match self {
            RequestBody::Query(params) => Some(params),
            RequestBody::Json(_) => None,
        }
    }

    pub fn json(&self) -> Option<&JsonMap> {
        match self {
            RequestBody::Json(params) => Some(params),
            RequestBody::Query(_) => None,
        }
    }
}

/// Per-request options handed to the transport alongside method and URI.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub headers: Headers,
    pub body: RequestBody,
    pub verify_tls: bool,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with a JSON body and no headers.
    pub fn json(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: body.into(),
        }
    }

    /// Value of the `Content-Type` header, ignoring ASCII case in the name.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `TransportError::Status`.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(TransportError::Status {
            status: self.status,
            body: self.body,
        })
    }
}

/// Flatten a params map into form-style query pairs.
///
/// Nested objects and arrays become bracketed keys (`filter[status]=open`,
/// `ids[0]=1`). Booleans are sent as `1` or `0`, nulls are dropped and
/// strings go through verbatim.
pub fn query_pairs(params: &JsonMap) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        push_pairs(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::Bool(b) => {
            let digit = if *b { "1" } else { "0" };
            pairs.push((key, digit.to_string()));
        }
        serde_json::Value::Number(n) => pairs.push((key, n.to_string())),
        serde_json::Value::String(s) => pairs.push((key, s.clone())),
        serde_json::Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, format!("{key}[{index}]"), item);
            }
        }
        serde_json::Value::Object(fields) => {
            for (field, item) in fields {
                push_pairs(pairs, format!("{key}[{field}]"), item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn header_lookup_ignores_case() {
        let headers = Headers::from([("Content-Type", "text/plain")]);
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
        assert_eq!(headers.get("accept"), None);
    }

    #[test]
    fn insert_replaces_existing_name() {
        let mut headers = Headers::from([("accept", "text/html")]);
        headers.insert("Accept", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("accept"), Some("application/json"));
    }

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let mut headers = Headers::from([("authorization", "Basic abc")]);
        headers.insert_if_absent("Authorization", "Bearer xyz");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Authorization"), Some("Basic abc"));
    }

    #[test]
    fn error_for_status_keeps_success() {
        let response = HttpResponse::json(r#"{"ok":true}"#)
            .error_for_status()
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn error_for_status_rejects_client_error() {
        let err = HttpResponse::with_status(404, "missing")
            .error_for_status()
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn content_type_lookup_ignores_case() {
        let mut response = HttpResponse::json("{}");
        assert_eq!(response.content_type(), Some("application/json"));

        response.headers = vec![("Content-Type".to_string(), "text/html".to_string())];
        assert_eq!(response.content_type(), Some("text/html"));

        response.headers.clear();
        assert_eq!(response.content_type(), None);
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    fn sorted_pairs(params: &JsonMap) -> Vec<(String, String)> {
        let mut pairs = query_pairs(params);
        pairs.sort();
        pairs
    }

    #[test]
    fn query_pairs_flattens_scalars() {
        let params = map(json!({
            "page": 2,
            "ratio": 0.5,
            "title": "docs",
            "cursor": null
        }));
        assert_eq!(
            sorted_pairs(&params),
            vec![
                pair("page", "2"),
                pair("ratio", "0.5"),
                pair("title", "docs"),
            ]
        );
    }

    #[test]
    fn query_pairs_sends_booleans_as_digits() {
        let params = map(json!({"active": false, "archived": true}));
        assert_eq!(
            sorted_pairs(&params),
            vec![pair("active", "0"), pair("archived", "1")]
        );
    }

    #[test]
    fn query_pairs_brackets_nested_values() {
        let params = map(json!({
            "filter": {"status": "open", "owner": {"id": 7}},
            "ids": [1, 2],
            "empty": []
        }));
        assert_eq!(
            sorted_pairs(&params),
            vec![
                pair("filter[owner][id]", "7"),
                pair("filter[status]", "open"),
                pair("ids[0]", "1"),
                pair("ids[1]", "2"),
            ]
        );
    }

    #[test]
    fn request_body_exposes_one_placement() {
        let body = RequestBody::Query(map(json!({"a": 1})));
        assert!(body.query().is_some());
        assert!(body.json().is_none());
    }
}
