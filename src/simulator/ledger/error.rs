use thiserror::Error;

/// Errors raised by the simulator's package ledger.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Package {0} was cancelled")]
    Cancelled(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}
