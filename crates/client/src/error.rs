use thiserror::Error;

use manualhub_core::DomainError;

/// Failure of a client-side workflow step.
///
/// Raised before any remote call; store failures are reported through the
/// workflow outcomes instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("{0}")]
    InvalidState(String),
}

impl WorkflowError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
