//! Health and readiness check endpoints
//!
//! GET /health  - liveness probe (server is up)
//! GET /ready   - readiness probe (upstream base URL and token configured)

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "tejelanas-gateway" })),
    )
}

/// GET /ready - readiness probe
///
/// Returns 503 while the upstream configuration is incomplete. Which
/// variable is missing is only logged at call time.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.client.is_configured() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "misconfigured" })),
        )
    }
}

/// Build the health router sub-tree
pub fn health_router() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;
    axum::Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}
