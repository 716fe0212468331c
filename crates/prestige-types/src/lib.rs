//! Foundation types for Prestige.
//!
//! This crate provides the declaration types every other Prestige crate works
//! with. A declaration describes a piece of infrastructure; it never does any
//! work at request time.
//!
//! # Key Types
//!
//! - [`StoreDefinition`]: Keyed persistent store with provisioned throughput
//! - [`ComputeUnitDefinition`]: Independently deployable request handler
//! - [`AccessGrant`]: Least-privilege binding from a compute unit to a store
//! - [`RouteDefinition`]: Path segment bound to exactly one compute unit
//! - [`CorsPolicy`]: Cross-origin policy applied by the ingress router

pub mod compute;
pub mod cors;
pub mod error;
pub mod grant;
pub mod route;
pub mod store;

pub use compute::{ComputeUnitDefinition, Runtime};
pub use cors::{AllowHeaders, AllowMethods, AllowOrigins, CorsPolicy, DEFAULT_CORS_HEADERS};
pub use error::TypeError;
pub use grant::{AccessGrant, Permission, PermissionSet};
pub use route::{HttpMethod, MethodMatch, RouteDefinition, RouteLimits};
pub use store::{KeySchema, KeyType, RetentionPolicy, StoreDefinition, Throughput};
