//! Stack topology for Prestige.
//!
//! A [`Topology`] is a single in-memory graph of stores, compute units,
//! access grants, and routes. It is built by a pure composition function
//! ([`compose::prestige_api`]) and carries no knowledge of any particular
//! provisioning toolkit: the deployer turns it into live resources.
//!
//! # Design Rules
//!
//! 1. Every reference (grant, route) names a declared resource.
//! 2. Store names, unit names, and route path segments are unique.
//! 3. Grants are additive and scoped to exactly one store.
//! 4. A topology that exists has passed validation.

pub mod compose;
pub mod config;
pub mod diff;
pub mod error;
pub mod topology;

pub use compose::{prestige_api, CORS_POLICY};
pub use config::StackConfig;
pub use diff::{plan, Change, Plan};
pub use error::{TopologyError, TopologyResult};
pub use topology::{ApiDefinition, Topology, TopologyBuilder};
