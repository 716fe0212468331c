//! Ingress router for Prestige.
//!
//! Maps the first path segment of each request to exactly one compute unit,
//! applies one CORS policy to every registered route, and forwards the
//! request. The unit's response is returned unchanged; unit failures become
//! `502`, timeouts `504`. Nothing is retried.

pub mod config;
pub mod error;
pub mod router;
pub mod server;

pub use config::{ServerConfig, DEFAULT_INTEGRATION_TIMEOUT, DEFAULT_MAX_BODY_BYTES};
pub use error::{ServerError, ServerResult};
pub use router::{cors_layer, IngressRouter, RouteBinding};
pub use server::IngressServer;
