//! # Blockchain Client
//!
//! Provider-agnostic Ethereum JSON-RPC client.
//!
//! ## Available Components
//!
//! - [`EthereumClient`]: typed `eth_*` operations over an ethers `Provider`
//! - [`HttpTransport`]: JSON-RPC 2.0 over HTTP(S), an ethers `JsonRpcClient`
//! - [`AccessListOutcome`]: best-effort EIP-2930 access-list result
//! - [`GasPrice`], [`GasEstimator`], [`FeeHistory`]: fee selection
//! - [`erc20`]: call-data codec for the ERC-20 methods the probe uses
//! - [`RpcClientError`]: error taxonomy

pub mod access_list;
pub mod client;
pub mod erc20;
pub mod error;
pub mod ethereum;
pub mod gas;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use access_list::{
    AccessListMissCause, AccessListOutcome, AccessListResult, GasMisestimationPolicy,
};
pub use client::{CallRequest, ReceiptStatus, TokenSnapshot, TxPriority, TxReceipt};
pub use error::{RpcClientError, RpcResult};
pub use ethereum::EthereumClient;
pub use gas::{FeeHistory, GasEstimator, GasPrice};
pub use transport::{HttpTransport, TransportError};
