use strata_types::EntityId;
use thiserror::Error;

/// Errors from storage-client calls.
///
/// These cover the build-and-submit surface only; per-operation failures
/// are reported through the operation handle's result code.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// The entity already exists.
    #[error("entity already exists: {0}")]
    AlreadyExists(EntityId),

    /// The call does not make sense for the given operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Opaque backend failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
