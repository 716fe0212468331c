use std::fmt;

use crate::action::Action;

/// Errors from access checks.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The principal's policy does not allow the action on the store.
    #[error("access denied: {principal} may not {action} on {store}")]
    AccessDenied {
        principal: String,
        action: Action,
        store: String,
    },

    /// A policy names a store that was never provisioned.
    #[error("store '{0}' is not provisioned")]
    UnknownStore(String),

    /// The underlying store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] prestige_store::StoreError),
}

impl GateError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

/// Result alias for gated operations.
pub type GateResult<T> = Result<T, GateError>;
