use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("route {0} is already bound")]
    DuplicateRoute(String),

    #[error("route /{segment} targets '{expected}' but was bound to '{actual}'")]
    UnitMismatch {
        segment: String,
        expected: String,
        actual: String,
    },

    #[error("invalid route: {0}")]
    InvalidRoute(#[from] prestige_types::TypeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
