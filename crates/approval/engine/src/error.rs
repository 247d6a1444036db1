use approval_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level errors. `Validation` messages are business-rule
/// violations surfaced verbatim to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("collaborator failure: {0}")]
    Collaborator(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
