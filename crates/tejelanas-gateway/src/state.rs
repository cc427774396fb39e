//! Shared application state for the route handlers

use crate::backend::ExternalApiClient;
use crate::config::GatewayConfig;
use crate::error::GatewayResult;

/// State shared across all request handlers
pub struct AppState {
    /// Boot-time configuration
    pub config: GatewayConfig,
    /// Relay to the external content API
    pub client: ExternalApiClient,
}

impl AppState {
    /// Build the state, constructing the client from `config`.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = ExternalApiClient::new(&config)?;
        Ok(Self { config, client })
    }
}
