use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("topology error: {0}")]
    Topology(#[from] prestige_topology::TopologyError),

    #[error("store error: {0}")]
    Store(#[from] prestige_store::StoreError),

    #[error("access error: {0}")]
    Gate(#[from] prestige_gate::GateError),

    #[error("compute error: {0}")]
    Compute(#[from] prestige_compute::ComputeError),

    #[error("ingress error: {0}")]
    Server(#[from] prestige_server::ServerError),

    #[error("state record error: {0}")]
    Record(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// `true` when a store's key schema would change. Never retryable.
    pub fn is_schema_conflict(&self) -> bool {
        matches!(
            self,
            Self::Store(prestige_store::StoreError::SchemaConflict { .. })
        )
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
