//! Axum-based HTTP server.
//!
//! [`GatewayServer`] wires the route handlers, the shared [`AppState`] and
//! the HTTP layers into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `GET`  | `/ready` | `503` until base URL and token are configured. |
//! | `GET`  | `/api/about` | Relay of `/about-us/`. |
//! | `GET`  | `/api/faq` | Relay of `/faq/`. |
//! | `GET`  | `/api/product-banner` | Relay of `/products-services/`. |
//! | `GET`  | `/api/products-services` | Relay of `/products-services/`. |
//! | `POST` | `/api/contact` | Validated relay to `/contact/`. |

use crate::config::{CorsOrigin, GatewayConfig};
use crate::error::{GatewayResult, RouteFailure};
use crate::handlers::{contact_router, health_router, resources_router};
use crate::middleware::request_id;
use crate::state::AppState;
use axum::{
    Router,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// HTTP server for the site's same-origin API.
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server from the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Build the axum [`Router`].
    ///
    /// Fails only if the HTTP client for the upstream cannot be constructed.
    pub fn build_app(&self) -> GatewayResult<Router> {
        let state = Arc::new(AppState::new(self.config.clone())?);

        let mut app = Router::new()
            .merge(health_router())
            .merge(resources_router())
            .merge(contact_router())
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn(request_id));

        if let Some(origin) = &self.config.cors_allow_origin {
            app = app.layer(cors_layer(origin));
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Bind to the configured address and serve until Ctrl-C.
    pub async fn start(self) -> std::io::Result<()> {
        let app = self.build_app().map_err(std::io::Error::other)?;
        let addr = self.config.bind_addr();
        info!(addr = %addr, "tejelanas gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

fn cors_layer(origin: &CorsOrigin) -> CorsLayer {
    let allow_origin = match origin {
        CorsOrigin::Any => AllowOrigin::any(),
        CorsOrigin::Exact(value) => AllowOrigin::exact(value.clone()),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

async fn not_found() -> impl IntoResponse {
    RouteFailure::new(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> impl IntoResponse {
    RouteFailure::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
