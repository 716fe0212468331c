//! Compute unit provisioning for Prestige.
//!
//! A compute unit is a stateless request handler packaged as a prebuilt
//! artifact with a single entry point. Provisioning resolves the artifact
//! through an [`ArtifactCatalog`] and binds the unit to the stores its
//! credential policy allows. Each [`ComputeUnit::invoke`] is one independent
//! request/response execution.
//!
//! Errors raised inside a handler are returned to the caller unchanged;
//! this layer neither retries nor recovers them.

pub mod catalog;
pub mod error;
pub mod handler;
pub mod package;
pub mod request;
pub mod stub;
pub mod unit;

pub use catalog::{ArtifactCatalog, InMemoryCatalog};
pub use error::{ComputeError, ComputeResult, InvocationError};
pub use handler::{Handler, InvocationContext};
pub use package::{inspect_artifact, ArtifactReport};
pub use request::{ProxyRequest, ProxyResponse};
pub use stub::EchoHandler;
pub use unit::{ComputeProvisioner, ComputeUnit};
