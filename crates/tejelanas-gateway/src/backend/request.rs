//! Outbound request description.

use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Request body sent to the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured body, serialized as JSON with `Content-Type: application/json`.
    Json(Value),
    /// Sent as-is; no content type is added.
    Text(String),
    /// Sent as-is; no content type is added.
    Bytes(Bytes),
}

/// One call to the upstream API.
///
/// Built per inbound route call and consumed by
/// [`ExternalApiClient::call`](super::ExternalApiClient::call).
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Endpoint path relative to the configured base URL. Must start with `/`.
    pub path: String,
    pub method: Method,
    /// Extra headers (names lowercased).
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
    /// Overrides the configured default timeout.
    pub timeout: Option<Duration>,
}

impl GatewayRequest {
    /// A `GET` request for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn with_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }
}
