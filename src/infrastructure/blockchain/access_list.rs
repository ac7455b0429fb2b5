//! # Access Lists
//!
//! Best-effort EIP-2930 access-list requests.
//!
//! `eth_createAccessList` is optional and inconsistently implemented across
//! providers. Every outcome other than a well-formed list is reported as an
//! [`AccessListOutcome::Unavailable`] carrying the classified cause, so the
//! caller can proceed without the list and still log why.
//!
//! Observed provider failure modes:
//!
//! - the method is not whitelisted (`-32601`)
//! - the handler crashes with a bare internal error (`-32603` without data)
//! - the provider's own gas estimation, used when the call carries no `gas`
//!   field, demands an absurd prepayment ("insufficient funds ... want N").
//!   Sending an explicit gas limit avoids that path.
//!
//! # Examples
//!
//! ```
//! use rpc_probe::infrastructure::blockchain::access_list::{
//!     AccessListMissCause, GasMisestimationPolicy, classify_miss,
//! };
//! use rpc_probe::infrastructure::blockchain::error::RpcClientError;
//! use ethers::types::U256;
//!
//! let error = RpcClientError::rpc(-32601, "rpc method is not whitelisted");
//! let cause = classify_miss(error, U256::zero(), false, &GasMisestimationPolicy::default());
//! assert!(matches!(cause, AccessListMissCause::MethodNotSupported { .. }));
//! ```

use super::error::RpcClientError;
use ethers::types::transaction::eip2930::{AccessList, AccessListItem};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
/// JSON-RPC "internal error".
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// One native currency unit, in wei.
const ONE_NATIVE_UNIT_WEI: u128 = 1_000_000_000_000_000_000;

/// A successfully generated access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListResult {
    /// Addresses and storage slots the call touches, in node order.
    pub access_list: AccessList,
    /// Gas the node reports the call uses with the list attached.
    pub gas_used: U256,
}

impl AccessListResult {
    /// Returns the entries.
    #[must_use]
    pub fn entries(&self) -> &[AccessListItem] {
        &self.access_list.0
    }

    /// Returns the number of storage keys across all entries.
    #[must_use]
    pub fn storage_key_count(&self) -> usize {
        self.entries().iter().map(|e| e.storage_keys.len()).sum()
    }
}

/// Raw `eth_createAccessList` result. Kept instead of ethers'
/// `AccessListWithGasUsed`, which drops geth's `error` member.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAccessListResponse {
    #[serde(default)]
    pub access_list: AccessList,
    pub gas_used: U256,
    #[serde(default)]
    pub error: Option<String>,
}

/// Why an access list could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessListMissCause {
    /// The provider does not expose `eth_createAccessList`.
    MethodNotSupported {
        /// JSON-RPC code.
        code: i64,
        /// Provider message.
        message: String,
    },
    /// The handler failed with a bare internal error (no `data`).
    HandlerCrashed {
        /// JSON-RPC code.
        code: i64,
        /// Provider message.
        message: String,
    },
    /// Provider-side gas estimation demanded an implausible prepayment.
    GasMisestimated {
        /// Funds the provider claimed were required, in wei.
        required: U256,
        /// The call's own value field, in wei.
        value: U256,
        /// Provider message.
        message: String,
    },
    /// The node traced the call but reported an execution error.
    ExecutionFailed {
        /// Node-reported error.
        reason: String,
    },
    /// Any other node error, verbatim.
    Rpc {
        /// JSON-RPC code.
        code: i64,
        /// Provider message.
        message: String,
    },
    /// Transport failure.
    Network {
        /// Transport error message.
        message: String,
    },
    /// Malformed result.
    Decode {
        /// Decode error message.
        message: String,
    },
}

impl AccessListMissCause {
    /// Short label for logs and reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MethodNotSupported { .. } => "method_not_supported",
            Self::HandlerCrashed { .. } => "handler_crashed",
            Self::GasMisestimated { .. } => "gas_misestimated",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Rpc { .. } => "rpc",
            Self::Network { .. } => "network",
            Self::Decode { .. } => "decode",
        }
    }
}

impl fmt::Display for AccessListMissCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotSupported { code, message } => {
                write!(f, "method not supported ({code}: {message})")
            }
            Self::HandlerCrashed { code, message } => {
                write!(f, "handler crashed ({code}: {message})")
            }
            Self::GasMisestimated {
                required, value, ..
            } => write!(
                f,
                "provider gas estimation demanded {required} wei for a call of value {value} wei; pass an explicit gas limit"
            ),
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Rpc { code, message } => write!(f, "rpc error {code}: {message}"),
            Self::Network { message } => write!(f, "network error: {message}"),
            Self::Decode { message } => write!(f, "decode error: {message}"),
        }
    }
}

/// Result of a best-effort access-list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccessListOutcome {
    /// The node produced a well-formed list.
    Available(AccessListResult),
    /// No list; proceed without one.
    Unavailable {
        /// Why the list is unavailable.
        cause: AccessListMissCause,
    },
}

impl AccessListOutcome {
    /// Returns true if a list is available.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the list to attach to a transaction, if any.
    #[must_use]
    pub fn access_list(&self) -> Option<&AccessList> {
        match self {
            Self::Available(result) => Some(&result.access_list),
            Self::Unavailable { .. } => None,
        }
    }

    /// Returns the miss cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&AccessListMissCause> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { cause } => Some(cause),
        }
    }

    /// Converts into a `Result` for callers that prefer `?`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::AccessListUnavailable`] on a miss.
    pub fn into_result(self) -> Result<AccessListResult, RpcClientError> {
        match self {
            Self::Available(result) => Ok(result),
            Self::Unavailable { cause } => Err(RpcClientError::AccessListUnavailable { cause }),
        }
    }
}

/// Policy deciding when an "insufficient funds" answer counts as a provider
/// gas misestimation rather than a genuine shortfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMisestimationPolicy {
    /// Prepayment (beyond the call's value) at or above which the demand is
    /// considered implausible, in wei.
    pub implausible_cost_wei: U256,
}

impl GasMisestimationPolicy {
    /// Creates a policy with the given threshold.
    #[must_use]
    pub const fn new(implausible_cost_wei: U256) -> Self {
        Self {
            implausible_cost_wei,
        }
    }

    /// Returns true if `required` is implausible for a call carrying `value`.
    #[must_use]
    pub fn is_implausible(&self, required: U256, value: U256) -> bool {
        required.saturating_sub(value) >= self.implausible_cost_wei
    }
}

impl Default for GasMisestimationPolicy {
    fn default() -> Self {
        Self::new(U256::from(ONE_NATIVE_UNIT_WEI))
    }
}

/// Extracts `N` from geth's "insufficient funds for gas * price + value:
/// address 0x.. have H want N" message.
#[must_use]
pub fn parse_required_funds(message: &str) -> Option<U256> {
    let lower = message.to_lowercase();
    if !lower.contains("insufficient funds") {
        return None;
    }
    let (_, tail) = lower.rsplit_once("want ")?;
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    U256::from_dec_str(&digits).ok()
}

fn is_method_missing(code: i64, message: &str) -> bool {
    let lower = message.to_lowercase();
    code == METHOD_NOT_FOUND_CODE
        || lower.contains("not whitelisted")
        || lower.contains("method not found")
        || lower.contains("does not exist")
        || lower.contains("not supported")
}

/// Maps a failed `eth_createAccessList` request to a miss cause.
///
/// `explicit_gas` must be true when the request carried a `gas` field; in
/// that case insufficient-funds answers are never treated as provider
/// misestimation.
#[must_use]
pub fn classify_miss(
    error: RpcClientError,
    value: U256,
    explicit_gas: bool,
    policy: &GasMisestimationPolicy,
) -> AccessListMissCause {
    match error {
        RpcClientError::Rpc {
            code,
            message,
            data,
        } => {
            if is_method_missing(code, &message) {
                return AccessListMissCause::MethodNotSupported { code, message };
            }
            if code == INTERNAL_ERROR_CODE && data.is_none() {
                return AccessListMissCause::HandlerCrashed { code, message };
            }
            if !explicit_gas
                && let Some(required) = parse_required_funds(&message)
                && policy.is_implausible(required, value)
            {
                return AccessListMissCause::GasMisestimated {
                    required,
                    value,
                    message,
                };
            }
            AccessListMissCause::Rpc { code, message }
        }
        RpcClientError::Revert { reason } => AccessListMissCause::ExecutionFailed { reason },
        RpcClientError::Network(message) | RpcClientError::Timeout { what: message, .. } => {
            AccessListMissCause::Network { message }
        }
        RpcClientError::AccessListUnavailable { cause } => cause,
        other => AccessListMissCause::Decode {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use ethers::types::{Address, H256};

    const MISESTIMATED: &str = "insufficient funds for gas * price + value: address 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 have 100000000000000000 want 30000600000000000000";

    fn policy() -> GasMisestimationPolicy {
        GasMisestimationPolicy::default()
    }

    #[test]
    fn forno_not_whitelisted() {
        let error = RpcClientError::rpc(-32601, "rpc method is not whitelisted");
        let cause = classify_miss(error, U256::zero(), false, &policy());
        assert_eq!(
            cause,
            AccessListMissCause::MethodNotSupported {
                code: -32601,
                message: "rpc method is not whitelisted".into()
            }
        );
    }

    #[test]
    fn method_missing_by_message_only() {
        let error = RpcClientError::rpc(-32000, "the method eth_createAccessList does not exist/is not available");
        assert_eq!(
            classify_miss(error, U256::zero(), false, &policy()).label(),
            "method_not_supported"
        );
    }

    #[test]
    fn internal_error_is_handler_crash() {
        let error = RpcClientError::rpc(-32603, "internal error");
        assert_eq!(
            classify_miss(error, U256::zero(), false, &policy()).label(),
            "handler_crashed"
        );
    }

    #[test]
    fn internal_error_with_data_is_plain_rpc_error() {
        let error = RpcClientError::Rpc {
            code: -32603,
            message: "internal error".into(),
            data: Some(serde_json::json!("0x08c379a0")),
        };
        assert_eq!(
            classify_miss(error, U256::zero(), false, &policy()),
            AccessListMissCause::Rpc {
                code: -32603,
                message: "internal error".into()
            }
        );
    }

    #[test]
    fn implausible_prepayment_without_gas_is_misestimation() {
        let error = RpcClientError::rpc(-32000, MISESTIMATED);
        match classify_miss(error, U256::zero(), false, &policy()) {
            AccessListMissCause::GasMisestimated { required, .. } => {
                assert_eq!(required, U256::from_dec_str("30000600000000000000").unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn explicit_gas_suppresses_misestimation() {
        let error = RpcClientError::rpc(-32000, MISESTIMATED);
        assert_eq!(
            classify_miss(error, U256::zero(), true, &policy()).label(),
            "rpc"
        );
    }

    #[test]
    fn plausible_shortfall_is_plain_rpc_error() {
        let error = RpcClientError::rpc(
            -32000,
            "insufficient funds for gas * price + value: have 0 want 21000000000000",
        );
        assert_eq!(
            classify_miss(error, U256::zero(), false, &policy()).label(),
            "rpc"
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let strict = GasMisestimationPolicy::new(U256::from(100u64));
        let error = RpcClientError::rpc(-32000, "insufficient funds: have 0 want 1000");
        assert_eq!(
            classify_miss(error, U256::zero(), false, &strict).label(),
            "gas_misestimated"
        );
    }

    #[test]
    fn value_is_discounted_from_required_funds() {
        let policy = GasMisestimationPolicy::new(U256::from(1_000u64));
        assert!(!policy.is_implausible(U256::from(1_500u64), U256::from(1_000u64)));
        assert!(policy.is_implausible(U256::from(2_000u64), U256::from(1_000u64)));
    }

    #[test]
    fn parse_required_funds_variants() {
        assert_eq!(
            parse_required_funds(MISESTIMATED),
            Some(U256::from_dec_str("30000600000000000000").unwrap())
        );
        assert_eq!(parse_required_funds("nonce too low"), None);
        assert_eq!(parse_required_funds("insufficient funds"), None);
    }

    #[test]
    fn network_and_decode_are_preserved() {
        let cause = classify_miss(
            RpcClientError::network("connection refused"),
            U256::zero(),
            false,
            &policy(),
        );
        assert_eq!(
            cause,
            AccessListMissCause::Network {
                message: "connection refused".into()
            }
        );
        let cause = classify_miss(
            RpcClientError::decode("bad json"),
            U256::zero(),
            false,
            &policy(),
        );
        assert_eq!(cause.label(), "decode");
    }

    #[test]
    fn outcome_accessors() {
        let result = AccessListResult {
            access_list: AccessList(vec![AccessListItem {
                address: Address::repeat_byte(1),
                storage_keys: vec![H256::repeat_byte(2), H256::repeat_byte(3)],
            }]),
            gas_used: U256::from(30_000u64),
        };
        let outcome = AccessListOutcome::Available(result.clone());
        assert!(outcome.is_available());
        assert_eq!(outcome.access_list().unwrap().0.len(), 1);
        assert_eq!(result.storage_key_count(), 2);
        assert_eq!(outcome.into_result().unwrap(), result);

        let miss = AccessListOutcome::Unavailable {
            cause: AccessListMissCause::Network {
                message: "down".into(),
            },
        };
        assert!(miss.access_list().is_none());
        assert!(miss.into_result().unwrap_err().is_recoverable());
    }

    #[test]
    fn response_parses_wire_shape() {
        let json = serde_json::json!({
            "accessList": [{
                "address": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                "storageKeys": ["0x0000000000000000000000000000000000000000000000000000000000000001"]
            }],
            "gasUsed": "0x8d2c"
        });
        let parsed: CreateAccessListResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.access_list.0.len(), 1);
        assert_eq!(parsed.gas_used, U256::from(0x8d2cu64));
        assert!(parsed.error.is_none());
    }
}
