use crate::legacy::LegacyError;
use crate::model::PackageStatus;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid state for package {tracking_id} ({status}): {reason}")]
    InvalidState {
        tracking_id: String,
        status: PackageStatus,
        reason: String,
    },

    #[error("Communication failure: {0}")]
    Communication(#[from] LegacyError),

    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl OrchestratorError {
    /// Whether trying the same request again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Communication(_) => true,
            OrchestratorError::Store(e) => matches!(e, StoreError::Unavailable(_)),
            _ => false,
        }
    }
}

impl From<StoreError> for OrchestratorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => OrchestratorError::NotFound(id),
            StoreError::InvalidState {
                tracking_id,
                status,
                reason,
            } => OrchestratorError::InvalidState {
                tracking_id,
                status,
                reason,
            },
            other => OrchestratorError::Store(other),
        }
    }
}
