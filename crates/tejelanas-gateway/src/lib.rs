//! `tejelanas-gateway`: backend-for-frontend for the Tejelanas Vivi site.
//!
//! The site UI only talks to same-origin `/api/*` routes. Each route relays
//! one fixed path of the external content API through
//! [`backend::ExternalApiClient`], which attaches the bearer token, bounds the
//! call with a timeout and classifies the outcome. Failures of any kind
//! become a uniform `502` envelope; upstream bodies and internal details are
//! logged, never returned.
//!
//! | Piece | Module |
//! |-------|--------|
//! | Upstream relay | [`backend`] |
//! | Error taxonomy and public envelope | [`error`] |
//! | Boot-time configuration | [`config`] |
//! | Route handlers | [`handlers`] |
//! | axum wiring | [`server`] |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tejelanas_gateway::config::GatewayConfig;
//! use tejelanas_gateway::server::GatewayServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::new("https://example.com/api/v1", "token");
//!     GatewayServer::new(config).start().await.unwrap();
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
