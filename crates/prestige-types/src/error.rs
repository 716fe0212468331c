use thiserror::Error;

/// Errors produced when a declaration violates its own invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid store name '{name}': {reason}")]
    InvalidStoreName { name: String, reason: String },

    #[error("store '{store}' has an empty partition key attribute name")]
    EmptyKeyName { store: String },

    #[error("store '{store}' declares non-positive {kind} capacity")]
    NonPositiveThroughput { store: String, kind: &'static str },

    #[error("compute unit name must not be empty")]
    EmptyUnitName,

    #[error("compute unit '{unit}' has an invalid entry point '{entry_point}'")]
    InvalidEntryPoint { unit: String, entry_point: String },

    #[error("compute unit '{unit}' has an empty artifact location")]
    EmptyArtifact { unit: String },

    #[error("invalid path segment '{segment}': {reason}")]
    InvalidPathSegment { segment: String, reason: String },

    #[error("route '{segment}' accepts no methods")]
    EmptyMethodSet { segment: String },

    #[error("route '{segment}' declares a zero concurrency limit")]
    ZeroConcurrency { segment: String },

    #[error("unknown runtime identifier: {0}")]
    UnknownRuntime(String),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    #[error("unknown key type: {0}")]
    UnknownKeyType(String),
}
