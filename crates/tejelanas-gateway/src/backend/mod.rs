//! Backend module.

mod external;
mod request;
mod url;

pub use external::{ExternalApiClient, UpstreamPayload};
pub use request::{GatewayRequest, RequestBody};
pub use url::join_url;
