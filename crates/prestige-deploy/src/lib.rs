//! Deployer for Prestige.
//!
//! Turns a validated [`Topology`](prestige_topology::Topology) into live
//! resources: stores through a [`StoreProvisioner`](prestige_store::StoreProvisioner),
//! compute units bound to policy-scoped stores, and an ingress router.
//!
//! Deployment is all-or-nothing up front: store schema checks and artifact
//! resolution run before anything is created, so a schema conflict leaves
//! existing stores and their data exactly as they were.

pub mod deployer;
pub mod deployment;
pub mod error;

pub use deployer::Deployer;
pub use deployment::{Deployment, DeploymentRecord, TeardownReport};
pub use error::{DeployError, DeployResult};
