//! # Error types for the orchestrator client boundary.
//!
//! The engine classifies failures into three kinds (initialization,
//! transient, terminal) at the call sites; [`ClientError`] carries the
//! categories the client layer can observe on its own:
//!
//! - [`ClientError::Cancelled`] the request was abandoned because the
//!   cancellation token fired. Never logged as a failure.
//! - [`ClientError::Api`] the orchestrator rejected or failed the request.
//! - [`ClientError::Malformed`] the response arrived but lacked a field
//!   the engine relies on.

use thiserror::Error;

/// Convenience alias for client-facing results.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of a single orchestrator request.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request was abandoned because cancellation fired.
    ///
    /// This is **not an error** in the traditional sense; callers suppress
    /// it instead of logging.
    #[error("request cancelled")]
    Cancelled,

    /// The orchestrator rejected or failed the request.
    #[error("orchestrator request failed: {message}")]
    Api {
        /// Human-readable failure description from the transport or service.
        message: String,
    },

    /// The response was missing a field the engine depends on.
    #[error("malformed orchestrator response: missing {field}")]
    Malformed {
        /// Name of the absent response field.
        field: &'static str,
    },
}

impl ClientError {
    /// Builds an [`ClientError::Api`] from any displayable failure.
    pub fn api(message: impl Into<String>) -> Self {
        ClientError::Api {
            message: message.into(),
        }
    }

    /// True when the failure was caused by cancellation rather than the
    /// orchestrator; such failures are suppressed, not reported.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}
