//! Read-only content endpoints
//!
//! GET /api/about             - about-us section
//! GET /api/faq               - frequently asked questions
//! GET /api/product-banner    - products and services shown in the banner
//! GET /api/products-services - products and services catalog
//!
//! Each route relays one fixed upstream path. The upstream payload is passed
//! through verbatim; picking `productos` / `servicios` apart is left to the
//! UI.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::RouteFailure;
use crate::state::AppState;

/// A public route backed by one upstream resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRoute {
    /// Same-origin path served to the UI.
    pub public_path: &'static str,
    /// Upstream endpoint relative to the configured base URL.
    pub upstream_path: &'static str,
    /// Public message used in the 502 envelope.
    pub failure_message: &'static str,
}

pub const RESOURCE_ROUTES: &[ResourceRoute] = &[
    ResourceRoute {
        public_path: "/api/about",
        upstream_path: "/about-us/",
        failure_message: "No se pudo obtener la información de la sección Nosotros.",
    },
    ResourceRoute {
        public_path: "/api/faq",
        upstream_path: "/faq/",
        failure_message: "No se pudieron obtener las Preguntas Frecuentes.",
    },
    // The banner reads the combined catalog; there is no separate banner resource.
    ResourceRoute {
        public_path: "/api/product-banner",
        upstream_path: "/products-services/",
        failure_message: "No se pudieron obtener los productos en el banner.",
    },
    ResourceRoute {
        public_path: "/api/products-services",
        upstream_path: "/products-services/",
        failure_message: "No se pudieron obtener los productos y servicios.",
    },
];

/// Relay `route` and map the outcome to the public response.
pub async fn relay(state: &AppState, route: &ResourceRoute) -> Response {
    match state.client.get(route.upstream_path).await {
        Ok(payload) => Json(payload.body).into_response(),
        Err(err) => {
            warn!(
                route = route.public_path,
                kind = ?err.kind(),
                error = %err,
                "upstream relay failed"
            );
            RouteFailure::bad_gateway(route.failure_message, &err, state.config.expose_error_detail)
                .into_response()
        }
    }
}

/// Build the content router sub-tree
pub fn resources_router() -> Router<Arc<AppState>> {
    RESOURCE_ROUTES.iter().fold(Router::new(), |router, route| {
        router.route(
            route.public_path,
            get(move |State(state): State<Arc<AppState>>| async move {
                relay(&state, route).await
            }),
        )
    })
}
