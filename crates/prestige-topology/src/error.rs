use prestige_types::TypeError;

/// Errors from building or loading a topology.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// A declaration violates its own invariants.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(#[from] TypeError),

    #[error("duplicate store name: {0}")]
    DuplicateStore(String),

    #[error("duplicate compute unit name: {0}")]
    DuplicateUnit(String),

    #[error("duplicate route path segment: /{0}")]
    DuplicateRoute(String),

    /// A grant or route names a compute unit that is not declared.
    #[error("{context} references unknown compute unit '{unit}'")]
    UnknownUnit { unit: String, context: String },

    /// A grant names a store that is not declared.
    #[error("grant for '{unit}' references unknown store '{store}'")]
    UnknownStore { unit: String, store: String },

    #[error("grant for '{unit}' on '{store}' carries no permissions")]
    EmptyGrant { unit: String, store: String },

    #[error("stack name must not be empty")]
    EmptyStackName,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
