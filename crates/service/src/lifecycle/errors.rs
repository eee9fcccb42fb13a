use models::service_request::RequestStatus;
use thiserror::Error;

/// Failures of a lifecycle operation. None of them leave partial writes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("concurrent update, reload and retry")]
    ConcurrencyConflict,
    #[error("{0}")]
    Forbidden(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl LifecycleError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::NotFound(_) => "not_found",
            LifecycleError::InvalidTransition { .. } => "invalid_transition",
            LifecycleError::Validation(_) => "validation",
            LifecycleError::ConcurrencyConflict => "conflict",
            LifecycleError::Forbidden(_) => "forbidden",
            LifecycleError::Persistence(_) => "persistence",
        }
    }
}
