//! # RPC Client Errors
//!
//! Error taxonomy for the Ethereum RPC client.
//!
//! ```text
//! RpcClientError
//! ├── Configuration          - bad setup, fatal
//! ├── Network                - transport failure, caller may retry
//! ├── Rpc { code, message }  - node returned a JSON-RPC error object
//! ├── Revert { reason }      - dry run rejected by the contract
//! ├── AccessListUnavailable  - recoverable access-list miss
//! ├── Unauthorized           - signing attempted without a signer
//! ├── Signing                - local signing failed
//! ├── Decode                 - malformed response shape
//! ├── Timeout                - receipt polling expired
//! └── InvalidArgument        - malformed caller input
//! ```
//!
//! # Examples
//!
//! ```
//! use rpc_probe::infrastructure::blockchain::error::RpcClientError;
//!
//! let error = RpcClientError::network("connection refused");
//! assert!(error.is_retryable());
//!
//! let error = RpcClientError::rpc(-32601, "rpc method is not whitelisted");
//! assert!(!error.is_retryable());
//! ```

use super::access_list::AccessListMissCause;
use super::erc20;
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC error code geth uses for `execution reverted`.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// Error type for RPC client operations.
#[derive(Debug, Clone, Error)]
pub enum RpcClientError {
    /// Invalid client setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure (connect, timeout, non-2xx without a JSON-RPC body).
    #[error("network error: {0}")]
    Network(String),

    /// The node rejected the request with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Provider-supplied message.
        message: String,
        /// Optional provider-supplied data (revert payloads live here).
        data: Option<Value>,
    },

    /// The simulated call reverted.
    #[error("execution reverted: {reason}")]
    Revert {
        /// Decoded revert reason, or the node message.
        reason: String,
    },

    /// The access list could not be obtained.
    #[error("access list unavailable: {cause}")]
    AccessListUnavailable {
        /// Why the access list is unavailable.
        cause: AccessListMissCause,
    },

    /// A signing operation was attempted without a matching signer.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Local transaction signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Response did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Waiting for a receipt exceeded the deadline.
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// Malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RpcClientError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a JSON-RPC error without data.
    #[must_use]
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a revert error.
    #[must_use]
    pub fn revert(reason: impl Into<String>) -> Self {
        Self::Revert {
            reason: reason.into(),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(what: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout_ms,
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns true for transient failures a caller may retry.
    ///
    /// The client itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    /// Returns true for outcomes callers are expected to absorb.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AccessListUnavailable { .. })
    }

    /// Returns the JSON-RPC error code, if this is a node error.
    #[must_use]
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Reclassifies a node error that reports a revert as [`Self::Revert`].
    /// Only the dry-run paths (transfer simulation, gas estimation) use it;
    /// plain contract reads keep the node error.
    ///
    /// Nodes signal reverts with code `3` or a message mentioning `revert`.
    /// The reason is decoded from `Error(string)` data when present.
    #[must_use]
    pub fn into_revert_if_reverted(self) -> Self {
        match self {
            Self::Rpc {
                code,
                message,
                data,
            } if code == EXECUTION_REVERTED_CODE || message.to_lowercase().contains("revert") => {
                let reason = data
                    .as_ref()
                    .and_then(revert_data_bytes)
                    .and_then(|bytes| erc20::decode_revert_reason(&bytes))
                    .unwrap_or_else(|| strip_revert_prefix(&message));
                Self::Revert { reason }
            }
            other => other,
        }
    }
}

/// Extracts revert bytes from the `data` member of a JSON-RPC error.
///
/// Providers either put the hex string directly in `data` or nest it as
/// `data.data`.
fn revert_data_bytes(data: &Value) -> Option<Vec<u8>> {
    let hex = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    ethers::utils::hex::decode(hex.trim_start_matches("0x")).ok()
}

fn strip_revert_prefix(message: &str) -> String {
    match message.split_once("execution reverted:") {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => message.to_string(),
    }
}

/// Result type for RPC client operations.
pub type RpcResult<T> = Result<T, RpcClientError>;
