//! # Application Errors
//!
//! Error types for the probe workflow.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Rpc(RpcClientError)                 - surfaced client errors
//! ├── InvalidTransition(InvalidTransition) - lifecycle violation
//! └── Validation(String)                  - bad plan or inputs
//! ```
//!
//! # Examples
//!
//! ```
//! use rpc_probe::application::error::ApplicationError;
//! use rpc_probe::infrastructure::blockchain::RpcClientError;
//!
//! let err: ApplicationError = RpcClientError::network("connection refused").into();
//! assert!(err.is_retryable());
//!
//! let err = ApplicationError::validation("send mode needs a signing account");
//! assert!(err.is_validation());
//! ```

use crate::domain::value_objects::InvalidTransition;
use crate::infrastructure::blockchain::RpcClientError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Error from the RPC client.
    #[error(transparent)]
    Rpc(#[from] RpcClientError),

    /// The lifecycle rejected a transition.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The request could not be carried out as given.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
