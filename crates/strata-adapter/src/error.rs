use thiserror::Error;

use strata_client::ClientError;
use strata_types::WaitError;

/// Errors from adapter calls.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A fault point armed for this call fired.
    #[error("fault injected at point {0}")]
    FaultInjected(&'static str),

    /// The storage client rejected the call.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Waiting for an operation timed out.
    #[error(transparent)]
    Wait(#[from] WaitError),
}

/// Result alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
