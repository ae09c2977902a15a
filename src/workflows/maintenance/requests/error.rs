use super::domain::{RequestId, RequestStatus};
use crate::workflows::maintenance::store::RepositoryError;

/// Error raised by the negotiation engine and its service facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("cannot {action} a request that is {}", .status.as_str())]
    InvalidTransition {
        status: RequestStatus,
        action: &'static str,
    },
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("maintenance request {0} not found")]
    NotFound(RequestId),
    #[error("maintenance request {id} is already {}", .status.as_str())]
    NotApplicable { id: RequestId, status: RequestStatus },
    #[error("maintenance request was modified (expected version {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },
    #[error("store failure: {0}")]
    Repository(RepositoryError),
}

impl NegotiationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }
}

impl From<RepositoryError> for NegotiationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict { expected, actual } => Self::Conflict { expected, actual },
            other => Self::Repository(other),
        }
    }
}
