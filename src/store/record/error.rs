use crate::model::PackageStatus;
use thiserror::Error;

/// Transitions a package record refuses.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("Package {tracking_id} cannot leave {status}: {reason}")]
    Forbidden {
        tracking_id: String,
        status: PackageStatus,
        reason: String,
    },

    #[error("Package {tracking_id} is {actual}, expected {expected}")]
    Unexpected {
        tracking_id: String,
        expected: PackageStatus,
        actual: PackageStatus,
    },

    #[error("Record key {key} does not match package {tracking_id}")]
    KeyMismatch { key: String, tracking_id: String },
}
