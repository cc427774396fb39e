//! Tejelanas gateway: entry point.
//!
//! Loads [`GatewayConfig`] from the environment (see the `config` module for
//! the variables) and starts the axum server.

use eyre::WrapErr;
use tejelanas_gateway::config::{GatewayConfig, LogFormat};
use tejelanas_gateway::server::GatewayServer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = GatewayConfig::from_env().wrap_err("failed to load gateway configuration")?;

    init_tracing(config.log_format);

    let missing = config.missing_upstream_vars();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "external API is not configured; every relay call will fail with a configuration error"
        );
    }

    info!(
        addr = %config.bind_addr(),
        base_url = config.base_url.as_deref().unwrap_or("<unset>"),
        token_present = config.api_token.is_some(),
        timeout_ms = u64::try_from(config.upstream_timeout.as_millis()).unwrap_or(u64::MAX),
        expose_error_detail = config.expose_error_detail,
        "gateway configuration loaded"
    );

    GatewayServer::new(config)
        .start()
        .await
        .wrap_err("gateway server error")
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tejelanas_gateway=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
