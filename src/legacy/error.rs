use crate::codec::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Communication failures talking to the legacy system.
///
/// Every variant is transient from the client's point of view and is retried.
/// Callers only ever see [`LegacyError::Exhausted`], wrapping the last attempt's failure.
#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("Connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("No response within {0:?}")]
    ReadTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed before a response was received")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] CodecError),

    #[error("Failed to communicate with WMS after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: Box<LegacyError> },
}

impl LegacyError {
    /// Number of attempts made before giving up, 1 for a bare failure.
    pub fn attempts(&self) -> u32 {
        match self {
            LegacyError::Exhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// The failure of the final attempt.
    pub fn root(&self) -> &LegacyError {
        match self {
            LegacyError::Exhausted { last, .. } => last.root(),
            other => other,
        }
    }
}
