//! # Client Types
//!
//! Request and receipt types exchanged with the RPC client.

use super::error::{RpcClientError, RpcResult};
use crate::domain::value_objects::format_units;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction priority for gas pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPriority {
    /// Low priority - slower confirmation.
    Low,
    /// Medium priority - standard confirmation.
    #[default]
    Medium,
    /// High priority - faster confirmation.
    High,
}

impl TxPriority {
    /// Index into the `[25, 50, 75]` reward percentiles requested from
    /// `eth_feeHistory`.
    #[must_use]
    pub const fn percentile_index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Percentage applied to the node's legacy gas price.
    #[must_use]
    pub const fn legacy_multiplier_percent(&self) -> u64 {
        match self {
            Self::Low => 90,
            Self::Medium => 100,
            Self::High => 120,
        }
    }
}

impl fmt::Display for TxPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// An unsigned call or transaction intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Sender.
    pub from: Address,
    /// Target contract or recipient.
    pub to: Address,
    /// Call data.
    pub data: Bytes,
    /// Value in wei.
    pub value: U256,
    /// Optional gas limit.
    pub gas: Option<u64>,
}

impl CallRequest {
    /// Creates a zero-value call without a gas limit.
    #[must_use]
    pub fn new(from: Address, to: Address, data: Bytes) -> Self {
        Self {
            from,
            to,
            data,
            value: U256::zero(),
            gas: None,
        }
    }

    /// Sets the value in wei.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the gas limit.
    #[must_use]
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Builds the transaction object sent with `eth_call`,
    /// `eth_estimateGas` and `eth_createAccessList`. `gas` overrides the
    /// request's own gas limit when given.
    #[must_use]
    pub fn to_transaction(&self, gas: Option<u64>) -> TypedTransaction {
        let mut tx = TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .value(self.value)
            .data(self.data.clone());
        if let Some(gas) = gas.or(self.gas) {
            tx = tx.gas(gas);
        }
        tx.into()
    }
}

/// Outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Execution succeeded.
    Success,
    /// Execution reverted.
    Failure,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Transaction receipt with confirmation details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Gas used by the transaction.
    pub gas_used: U256,
    /// Block number where the transaction was included.
    pub block_number: u64,
    /// Effective gas price paid, when reported.
    pub effective_gas_price: Option<U256>,
}

impl TxReceipt {
    /// Returns true if execution succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// ERC-20 metadata together with one holder's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    /// Token contract.
    pub token: Address,
    /// Holder whose balance was read.
    pub holder: Address,
    /// `symbol()`.
    pub symbol: String,
    /// `decimals()`.
    pub decimals: u8,
    /// `balanceOf(holder)` in base units.
    pub balance: U256,
}

impl TokenSnapshot {
    /// Balance scaled by the token decimals.
    #[must_use]
    pub fn formatted_balance(&self) -> String {
        format_units(self.balance, self.decimals)
    }
}

impl TryFrom<TransactionReceipt> for TxReceipt {
    type Error = RpcClientError;

    fn try_from(receipt: TransactionReceipt) -> RpcResult<Self> {
        let status = match receipt.status.map(|s| s.as_u64()) {
            Some(1) => ReceiptStatus::Success,
            Some(0) => ReceiptStatus::Failure,
            Some(other) => {
                return Err(RpcClientError::decode(format!(
                    "unexpected receipt status {other}"
                )));
            }
            None => return Err(RpcClientError::decode("receipt has no status field")),
        };
        let block_number = receipt
            .block_number
            .ok_or_else(|| RpcClientError::decode("receipt has no block number"))?
            .as_u64();

        Ok(Self {
            tx_hash: receipt.transaction_hash,
            status,
            gas_used: receipt.gas_used.unwrap_or_default(),
            block_number,
            effective_gas_price: receipt.effective_gas_price,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receipt(extra: serde_json::Value) -> TransactionReceipt {
        let mut json = json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "transactionIndex": "0x0",
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "cumulativeGasUsed": "0xb411",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256))
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn transaction_omits_missing_gas() {
        let request = CallRequest::new(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
        );
        let json = serde_json::to_value(request.to_transaction(None)).unwrap();
        assert!(json.get("gas").is_none());
        assert_eq!(json["value"], json!("0x0"));
        assert_eq!(json["data"], json!("0xa9059cbb"));
        assert_eq!(json["to"], json!(format!("{:?}", Address::repeat_byte(2))));
    }

    #[test]
    fn transaction_gas_override_wins() {
        let request = CallRequest::new(Address::zero(), Address::zero(), Bytes::new()).with_gas(21_000);
        let json = serde_json::to_value(request.to_transaction(Some(100_000))).unwrap();
        assert_eq!(json["gas"], json!("0x186a0"));
        let json = serde_json::to_value(request.to_transaction(None)).unwrap();
        assert_eq!(json["gas"], json!("0x5208"));
    }

    #[test]
    fn receipt_from_node() {
        let receipt = TxReceipt::try_from(receipt(json!({
            "blockNumber": "0x10",
            "gasUsed": "0xb411",
            "status": "0x1",
            "effectiveGasPrice": "0x3b9aca00"
        })))
        .unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, U256::from(0xb411u64));
        assert_eq!(receipt.effective_gas_price, Some(U256::from(1_000_000_000u64)));
    }

    #[test]
    fn failed_receipt() {
        let receipt = TxReceipt::try_from(receipt(json!({
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "status": "0x0"
        })))
        .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Failure);
        assert!(receipt.effective_gas_price.is_none());
    }

    #[test]
    fn receipt_without_status_is_decode_error() {
        assert!(matches!(
            TxReceipt::try_from(receipt(json!({ "blockNumber": "0x1" }))),
            Err(RpcClientError::Decode(_))
        ));
    }

    #[test]
    fn pending_receipt_without_block_is_decode_error() {
        assert!(matches!(
            TxReceipt::try_from(receipt(json!({ "status": "0x1" }))),
            Err(RpcClientError::Decode(_))
        ));
    }

    #[test]
    fn snapshot_formats_balance() {
        let snapshot = TokenSnapshot {
            token: Address::zero(),
            holder: Address::zero(),
            symbol: "USDC".into(),
            decimals: 6,
            balance: U256::from(1_000_000u64),
        };
        assert_eq!(snapshot.formatted_balance(), "1");
    }

    #[test]
    fn priority_mapping() {
        assert_eq!(TxPriority::default(), TxPriority::Medium);
        assert_eq!(TxPriority::High.percentile_index(), 2);
        assert_eq!(TxPriority::Low.legacy_multiplier_percent(), 90);
    }
}
