//! Keyed table storage and store provisioning for Prestige.
//!
//! A store is a key-value table with a single partition key declared by a
//! [`StoreDefinition`](prestige_types::StoreDefinition). This crate provides
//! the table contract ([`TableStore`]), an in-memory table, and the
//! provisioner that turns declarations into tables.
//!
//! # Storage Backends
//!
//! - [`InMemoryTable`] -- `BTreeMap`-based table for tests and embedding
//! - [`InMemoryProvisioner`] -- account-like registry of in-memory tables
//!
//! # Design Rules
//!
//! 1. Item uniqueness is guaranteed on the partition key.
//! 2. Every write carries a partition key of the declared type.
//! 3. A store's key schema never changes; redeclaring it differently is a
//!    fatal conflict that leaves the existing store untouched.
//! 4. Retained stores outlive the stack that declared them.

pub mod error;
pub mod memory;
pub mod provisioner;
pub mod traits;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTable;
pub use provisioner::{InMemoryProvisioner, TableDescription, TeardownOutcome};
pub use traits::{StoreProvisioner, TableStore};
pub use value::{item_from_json, item_to_json, AttributeValue, Condition, Item};
