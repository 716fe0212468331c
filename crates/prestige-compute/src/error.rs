use std::path::PathBuf;

use thiserror::Error;

/// Deploy-time errors from provisioning a compute unit. All are fatal.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("artifact for '{unit}' not found at {}", artifact.display())]
    ArtifactNotFound { unit: String, artifact: PathBuf },

    #[error("artifact {} for '{unit}' has no entry point '{entry_point}'", artifact.display())]
    EntryPointMissing {
        unit: String,
        artifact: PathBuf,
        entry_point: String,
    },

    #[error("invalid compute unit definition: {0}")]
    InvalidDefinition(#[from] prestige_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for provisioning operations.
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Errors raised while a unit handles a request.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The handler reported a failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// A store operation was denied or failed.
    #[error(transparent)]
    Gate(#[from] prestige_gate::GateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InvocationError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}
