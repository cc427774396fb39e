//! Process-wide gateway configuration.
//!
//! [`GatewayConfig`] is built once at boot and handed by reference to
//! [`ExternalApiClient::new`](crate::backend::ExternalApiClient::new) and to
//! the server state. Values come from an optional file named by
//! `GATEWAY_CONFIG` (format detected from the extension), overlaid by the
//! process environment.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `EXTERNAL_API_URL_BASE` | *(none)* | Upstream base URL. |
//! | `EXTERNAL_API_TOKEN` | *(none)* | Bearer token sent upstream. |
//! | `GATEWAY_HOST` | `0.0.0.0` | Bind address. |
//! | `GATEWAY_PORT` | `3000` | TCP port to listen on. |
//! | `UPSTREAM_TIMEOUT_MS` | `10000` | Per-call upstream timeout. |
//! | `EXPOSE_ERROR_DETAIL` | `false` | Attach `detail` to failure envelopes. |
//! | `ALLOW_AUTHORIZATION_OVERRIDE` | `false` | Let caller headers replace the bearer. |
//! | `CORS_ALLOW_ORIGIN` | *(none)* | Enable CORS for one origin, or `*`. |
//! | `LOG_FORMAT` | `text` | `text` or `json`. |
//!
//! A missing base URL or token is not a load error: the gateway still boots
//! and every upstream call reports [`GatewayError::Config`](crate::error::GatewayError::Config).

use axum::http::HeaderValue;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default per-call upstream timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Environment variable holding the upstream base URL.
pub const BASE_URL_VAR: &str = "EXTERNAL_API_URL_BASE";

/// Environment variable holding the upstream bearer token.
pub const TOKEN_VAR: &str = "EXTERNAL_API_TOKEN";

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_VAR: &str = "GATEWAY_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("config parsing error: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigLoadError>;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> ConfigResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigLoadError::Invalid {
                key: "LOG_FORMAT",
                reason: format!("expected 'text' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Allowed CORS origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    Exact(HeaderValue),
}

/// Keys exactly as they appear in the file / environment.
///
/// Every value stays a string until [`GatewayConfig::from_raw`] converts the
/// typed keys, so the token and URL reach the client byte for byte.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    external_api_url_base: Option<String>,
    external_api_token: Option<String>,
    gateway_host: Option<String>,
    gateway_port: Option<String>,
    upstream_timeout_ms: Option<String>,
    expose_error_detail: Option<String>,
    allow_authorization_override: Option<String>,
    cors_allow_origin: Option<String>,
    log_format: Option<String>,
}

/// Validated gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Upstream base URL, e.g. `https://example.com/api/v1`.
    pub base_url: Option<String>,
    /// Static bearer token for the upstream API.
    pub api_token: Option<String>,
    pub host: String,
    pub port: u16,
    /// Timeout applied to calls that do not set their own.
    pub upstream_timeout: Duration,
    pub expose_error_detail: bool,
    pub allow_authorization_override: bool,
    pub cors_allow_origin: Option<CorsOrigin>,
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            upstream_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            expose_error_detail: false,
            allow_authorization_override: false,
            cors_allow_origin: None,
            log_format: LogFormat::Text,
        }
    }
}

// The token never reaches logs, not even through `{:?}`.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("expose_error_detail", &self.expose_error_detail)
            .field("allow_authorization_override", &self.allow_authorization_override)
            .field("cors_allow_origin", &self.cors_allow_origin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl GatewayConfig {
    /// Configuration pointing at `base_url` with `token`, everything else default.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Load from `GATEWAY_CONFIG` (if set) and the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let file = std::env::var(CONFIG_FILE_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty());
        Self::load(file.as_deref(), None)
    }

    /// Load from an optional file plus an environment map.
    ///
    /// When `env` is `None` the real process environment is read.
    pub fn load(file: Option<&str>, env: Option<config::Map<String, String>>) -> ConfigResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        builder = builder.add_source(
            Environment::default()
                .ignore_empty(true)
                .source(env),
        );

        let raw: RawSettings = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| ConfigLoadError::Parse(e.to_string()))?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> ConfigResult<Self> {
        let defaults = Self::default();

        let timeout_ms =
            parse_number(raw.upstream_timeout_ms, "UPSTREAM_TIMEOUT_MS")?.unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(ConfigLoadError::Invalid {
                key: "UPSTREAM_TIMEOUT_MS",
                reason: "must be greater than 0".to_string(),
            });
        }

        let cors_allow_origin = match non_blank(raw.cors_allow_origin) {
            None => None,
            Some(origin) if origin == "*" => Some(CorsOrigin::Any),
            Some(origin) => Some(CorsOrigin::Exact(HeaderValue::from_str(&origin).map_err(
                |e| ConfigLoadError::Invalid {
                    key: "CORS_ALLOW_ORIGIN",
                    reason: e.to_string(),
                },
            )?)),
        };

        let log_format = match non_blank(raw.log_format) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::Text,
        };

        Ok(Self {
            base_url: non_blank(raw.external_api_url_base),
            api_token: non_blank(raw.external_api_token),
            host: non_blank(raw.gateway_host).unwrap_or(defaults.host),
            port: parse_number(raw.gateway_port, "GATEWAY_PORT")?.unwrap_or(defaults.port),
            upstream_timeout: Duration::from_millis(timeout_ms),
            expose_error_detail: parse_flag(raw.expose_error_detail, "EXPOSE_ERROR_DETAIL")?
                .unwrap_or(false),
            allow_authorization_override: parse_flag(
                raw.allow_authorization_override,
                "ALLOW_AUTHORIZATION_OVERRIDE",
            )?
            .unwrap_or(false),
            cors_allow_origin,
            log_format,
        })
    }

    /// Names of the required upstream variables that are not set.
    pub fn missing_upstream_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_url.is_none() {
            missing.push(BASE_URL_VAR);
        }
        if self.api_token.is_none() {
            missing.push(TOKEN_VAR);
        }
        missing
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.upstream_timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn with_expose_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    pub fn with_authorization_override(mut self, allow: bool) -> Self {
        self.allow_authorization_override = allow;
        self
    }

    pub fn with_cors_origin(mut self, origin: CorsOrigin) -> Self {
        self.cors_allow_origin = Some(origin);
        self
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T>(value: Option<String>, key: &'static str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    non_blank(value)
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigLoadError::Invalid {
                key,
                reason: format!("'{v}': {e}"),
            })
        })
        .transpose()
}

fn parse_flag(value: Option<String>, key: &'static str) -> ConfigResult<Option<bool>> {
    non_blank(value)
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigLoadError::Invalid {
                key,
                reason: format!("expected a boolean, got '{v}'"),
            }),
        })
        .transpose()
}
