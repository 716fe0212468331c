use prestige_types::{KeySchema, KeyType};

/// Errors from table and provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A store with this name exists with a different key schema.
    ///
    /// Fatal and non-retryable: the operator must resolve it.
    #[error("schema conflict on store '{store}': existing key {existing}, requested {requested}")]
    SchemaConflict {
        store: String,
        existing: KeySchema,
        requested: KeySchema,
    },

    #[error("store not found: {0}")]
    StoreNotFound(String),

    /// The declaration itself is invalid.
    #[error("invalid store definition: {0}")]
    InvalidDefinition(#[from] prestige_types::TypeError),

    /// An item is missing its partition key attribute.
    #[error("item in '{store}' is missing key attribute '{attribute}'")]
    MissingKey { store: String, attribute: String },

    /// The partition key value has the wrong type.
    #[error("key attribute '{attribute}' in '{store}' must be {expected}")]
    KeyTypeMismatch {
        store: String,
        attribute: String,
        expected: KeyType,
    },

    /// An update tried to change the partition key of an item.
    #[error("key attribute '{attribute}' in '{store}' cannot be updated")]
    KeyUpdate { store: String, attribute: String },

    /// A conditional write's condition did not hold.
    #[error("conditional check failed on '{store}': {condition}")]
    ConditionFailed { store: String, condition: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
