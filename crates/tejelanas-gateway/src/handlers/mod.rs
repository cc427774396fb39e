//! Same-origin route handlers consumed by the site UI

pub mod contact;
pub mod health;
pub mod resources;

pub use contact::contact_router;
pub use health::health_router;
pub use resources::{RESOURCE_ROUTES, ResourceRoute, resources_router};
