//! Gateway error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Flat classification of a failed upstream call, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigError,
    InvalidRequest,
    UpstreamHttpError,
    Timeout,
    NetworkError,
}

/// Why an in-flight upstream call was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The per-call timer fired.
    Deadline,
    /// The caller triggered the cancellation token.
    Cancelled,
}

/// Failure of a single upstream call.
///
/// The `Display` text is the only message that may leave the process. It
/// names at most the endpoint path and the upstream status; upstream bodies,
/// transport errors and missing variable names are logged where the failure
/// is detected and never stored here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("server configuration error while contacting the external API")]
    Config,

    #[error("internal server error while contacting the external API")]
    InvalidRequest,

    #[error("error {status} from external API calling {path}")]
    UpstreamHttp { path: String, status: u16 },

    #[error("timeout after {timeout_ms} ms calling {path}")]
    Timeout {
        path: String,
        timeout_ms: u64,
        elapsed_ms: u64,
        reason: AbortReason,
    },

    #[error("network or connection error calling {path}")]
    Network { path: String },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Config => ErrorKind::ConfigError,
            GatewayError::InvalidRequest => ErrorKind::InvalidRequest,
            GatewayError::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
            GatewayError::Timeout { .. } => ErrorKind::Timeout,
            GatewayError::Network { .. } => ErrorKind::NetworkError,
        }
    }

    /// Upstream HTTP status, when the failure carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            GatewayError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Public failure envelope: `{"success": false, "message": ..., "detail"?: ...}`.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl RouteFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// 502 envelope for a failed upstream call.
    ///
    /// `detail` carries the error's generic message and is only attached when
    /// `expose_detail` is set.
    pub fn bad_gateway(message: impl Into<String>, err: &GatewayError, expose_detail: bool) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
            detail: expose_detail.then(|| err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("message".into(), Value::String(self.message.clone()));
        if let Some(detail) = &self.detail {
            body.insert("detail".into(), Value::String(detail.clone()));
        }
        Value::Object(body)
    }
}

impl IntoResponse for RouteFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}
