//! Authenticated relay to the external content API.
//!
//! [`ExternalApiClient`] sends one request per call to
//! `{base_url}{path}`, attaching the configured bearer token, and classifies
//! the outcome into an [`UpstreamPayload`] or a [`GatewayError`]. There are
//! no retries. Each call is bounded by a timer and can be abandoned through a
//! [`CancellationToken`]; either way the in-flight exchange is dropped, which
//! aborts the HTTP request and releases its connection.

use super::request::{GatewayRequest, RequestBody};
use super::url::join_url;
use crate::config::GatewayConfig;
use crate::error::{AbortReason, GatewayError, GatewayResult};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

/// Successful upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPayload {
    /// Upstream HTTP status (always 2xx).
    pub status: u16,
    /// Upstream `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Parsed JSON, `{"data": <text>}` for non-JSON bodies, `null` for 204.
    pub body: Value,
}

struct Upstream {
    base_url: String,
    token: String,
}

/// Proxies calls to the configured upstream REST API.
pub struct ExternalApiClient {
    upstream: Option<Upstream>,
    missing_vars: Vec<&'static str>,
    default_timeout: Duration,
    allow_authorization_override: bool,
    client: Client,
}

impl ExternalApiClient {
    /// Build the client from boot-time configuration.
    ///
    /// A configuration without base URL or token still yields a client; its
    /// calls all fail with [`GatewayError::Config`]. Only a failure to build
    /// the HTTP client itself is reported here, also as `Config`.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder().build().map_err(|e| {
            error!(error = %e, "failed to build the external API HTTP client");
            GatewayError::Config
        })?;

        let upstream = match (&config.base_url, &config.api_token) {
            (Some(base_url), Some(token)) => Some(Upstream {
                base_url: base_url.clone(),
                token: token.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            upstream,
            missing_vars: config.missing_upstream_vars(),
            default_timeout: config.upstream_timeout,
            allow_authorization_override: config.allow_authorization_override,
            client,
        })
    }

    /// `true` when base URL and token are both configured.
    pub fn is_configured(&self) -> bool {
        self.upstream.is_some()
    }

    /// Shorthand for a `GET` of `path`.
    pub async fn get(&self, path: &str) -> GatewayResult<UpstreamPayload> {
        self.call(GatewayRequest::new(path)).await
    }

    /// Send `request` with a private cancellation token.
    pub async fn call(&self, request: GatewayRequest) -> GatewayResult<UpstreamPayload> {
        self.call_with_cancel(request, CancellationToken::new()).await
    }

    /// Send `request`, abandoning it when `cancel` fires or its timeout expires.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn call_with_cancel(
        &self,
        request: GatewayRequest,
        cancel: CancellationToken,
    ) -> GatewayResult<UpstreamPayload> {
        let Some(upstream) = &self.upstream else {
            error!(missing = ?self.missing_vars, "external API base URL or token is not configured");
            return Err(GatewayError::Config);
        };

        if !request.path.starts_with('/') {
            error!(path = %request.path, "endpoint must start with '/'");
            return Err(GatewayError::InvalidRequest);
        }

        let timeout = request.timeout.unwrap_or(self.default_timeout);
        if timeout.is_zero() {
            error!("timeout must be greater than 0 ms");
            return Err(GatewayError::InvalidRequest);
        }

        let url = join_url(&upstream.base_url, &request.path);
        let headers = resolve_headers(&upstream.token, &request, self.allow_authorization_override)?;
        let builder = attach_body(
            self.client
                .request(request.method.clone(), &url)
                .headers(headers),
            request.body.as_ref(),
        );
        debug!(url = %url, timeout_ms = millis(timeout), "calling external API");

        let start = Instant::now();
        let reason = tokio::select! {
            outcome = exchange(builder, &request.path) => return outcome,
            _ = cancel.cancelled() => AbortReason::Cancelled,
            _ = tokio::time::sleep(timeout) => AbortReason::Deadline,
        };

        // The exchange future was dropped by `select!`, aborting the request.
        let elapsed_ms = millis(start.elapsed());
        error!(elapsed_ms, reason = ?reason, "external API call aborted");
        Err(GatewayError::Timeout {
            path: request.path,
            timeout_ms: millis(timeout),
            elapsed_ms,
            reason,
        })
    }
}

/// Send the request and classify the response.
async fn exchange(builder: RequestBuilder, path: &str) -> GatewayResult<UpstreamPayload> {
    let response = builder.send().await.map_err(|e| {
        error!(error = %e, "network error calling external API");
        GatewayError::Network { path: path.to_string() }
    })?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let detail = upstream_error_detail(&text).unwrap_or_default();
        error!(status = status.as_u16(), detail = %detail, "external API returned an error status");
        return Err(GatewayError::UpstreamHttp {
            path: path.to_string(),
            status: status.as_u16(),
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(UpstreamPayload {
            status: status.as_u16(),
            content_type: None,
            body: Value::Null,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = read_body(response, content_type.as_deref(), path).await?;
    Ok(UpstreamPayload {
        status: status.as_u16(),
        content_type,
        body,
    })
}

async fn read_body(response: Response, content_type: Option<&str>, path: &str) -> GatewayResult<Value> {
    let network = |e: reqwest::Error| {
        error!(error = %e, "failed to read external API response body");
        GatewayError::Network { path: path.to_string() }
    };

    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        let bytes = response.bytes().await.map_err(network)?;
        return serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "external API sent malformed JSON");
            GatewayError::Network { path: path.to_string() }
        });
    }

    let text = response.text().await.map_err(network)?;
    warn!(
        content_type = content_type.unwrap_or_default(),
        "external API response is not JSON, returning it as text"
    );
    Ok(json!({ "data": text }))
}

/// Build the outbound header set.
///
/// `Accept` and the JSON `Content-Type` are defaults the caller may replace.
/// A caller `Authorization` header is dropped unless `allow_override` is set.
fn resolve_headers(
    token: &str,
    request: &GatewayRequest,
    allow_override: bool,
) -> GatewayResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if matches!(request.body, Some(RequestBody::Json(_))) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    for (name, value) in &request.headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            warn!(header = %name, "skipping invalid caller header");
            continue;
        };
        if name == AUTHORIZATION && !allow_override {
            warn!("ignoring caller-supplied authorization header");
            continue;
        }
        headers.insert(name, value);
    }

    if !headers.contains_key(AUTHORIZATION) {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            error!("external API token is not a valid header value");
            GatewayError::Config
        })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
    }

    Ok(headers)
}

fn attach_body(builder: RequestBuilder, body: Option<&RequestBody>) -> RequestBuilder {
    match body {
        None => builder,
        Some(RequestBody::Json(value)) => builder.body(value.to_string()),
        Some(RequestBody::Text(text)) => builder.body(text.clone()),
        Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
    }
}

/// Best-effort human-readable detail from an upstream error body.
fn upstream_error_detail(text: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(text).ok()?;
    ["msg", "message", "detail"]
        .iter()
        .find_map(|key| parsed.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
