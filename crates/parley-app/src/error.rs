//! Runtime error types.

use std::time::Duration;

use parley_client::ClientError;
use thiserror::Error;

/// Errors from the REST collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Service answered with an error status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Error body.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Call exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Returns true if retrying the call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// Errors returned to screens by [`SessionHandle`](crate::SessionHandle).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Runtime has stopped.
    #[error("session closed")]
    Closed,

    /// Client rejected the request.
    #[error(transparent)]
    Client(#[from] ClientError),
}
