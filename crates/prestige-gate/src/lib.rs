//! Access grant resolution for Prestige.
//!
//! Every compute unit reaches stores only through the credential policy
//! derived from its declared grants. The resolver turns
//! [`AccessGrant`](prestige_types::AccessGrant)s into minimal per-store
//! policy statements; [`ScopedStores`] enforces them on every operation.
//!
//! Omitting a grant is the way to deny access: anything a policy does not
//! explicitly allow is denied.
//!
//! # Quick Start
//!
//! ```rust
//! use prestige_gate::{Action, GrantResolver};
//! use prestige_types::AccessGrant;
//!
//! let grants = vec![AccessGrant::read_write("Rankings", "prestige-companies")];
//! let policies = GrantResolver::resolve(["Rankings"], &grants);
//! let policy = &policies["Rankings"];
//! assert!(policy.allows("prestige-companies", Action::Scan));
//! assert!(!policy.allows("prestige-matchups", Action::Scan));
//! ```

pub mod action;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod scoped;

pub use action::Action;
pub use error::{GateError, GateResult};
pub use policy::{CredentialPolicy, Effect, PolicyStatement};
pub use resolver::GrantResolver;
pub use scoped::{ScopedStores, ScopedTable};
