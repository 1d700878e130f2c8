use thiserror::Error;

/// Errors surfaced by the lift store and the progression calculator.
///
/// Calculation errors are deterministic for a given input, so callers should
/// report them rather than retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Input that can never be valid, e.g. a non-positive weight step.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is valid in general but not for the lift's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("a lift named '{0}' already exists")]
    DuplicateName(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn lift_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("lift {}", id))
    }

    /// Whether the error describes a problem with the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::InvalidState(_)
                | Self::NotFound(_)
                | Self::DuplicateName(_)
        )
    }
}
