//! # Probe
//!
//! Runs the provider comparison workflow on top of [`EthereumClient`].
//!
//! This module provides:
//! - [`Probe::snapshot`]: native and token balances, read concurrently
//! - [`Probe::run_transfer`]: simulate, request an access list, and
//!   optionally send a token transfer
//!
//! # Transfer Flow
//!
//! ```text
//! decimals() → eth_call dry run → eth_createAccessList ─┬─ read-only: stop
//!                                   (miss: no list)     └─ send: sign → submit → poll receipt
//! ```
//!
//! Every step is recorded in a [`TxLifecycle`]; an access-list miss moves
//! the lifecycle to `AccessListSkipped` and the flow continues without it.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::value_objects::{
    Account, ChainConfig, InvalidTransition, TokenAmount, TxLifecycle, TxState, format_units,
};
use crate::infrastructure::blockchain::{
    AccessListOutcome, CallRequest, EthereumClient, HttpTransport, RpcClientError, TokenSnapshot,
    TxReceipt,
};
use ethers::providers::JsonRpcClient;
use ethers::types::{Address, TxHash, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Default receipt poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
/// Default receipt deadline.
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 120_000;

/// Balances of one holder on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Chain the balances were read from.
    pub chain: ChainConfig,
    /// Holder.
    pub holder: Address,
    /// Native balance in wei.
    pub native_balance: U256,
    /// Token metadata and balance.
    pub token: TokenSnapshot,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chain:          {} ({})", self.chain.name, self.chain.chain_id)?;
        writeln!(f, "holder:         {:?}", self.holder)?;
        writeln!(
            f,
            "native balance: {} {}",
            format_units(self.native_balance, self.chain.native_currency_decimals),
            self.chain.native_currency_symbol
        )?;
        writeln!(f, "token:          {:?}", self.token.token)?;
        write!(
            f,
            "token balance:  {} {} ({} decimals)",
            self.token.formatted_balance(),
            self.token.symbol,
            self.token.decimals
        )
    }
}

/// What [`Probe::run_transfer`] should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Token contract.
    pub token: Address,
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub recipient: Address,
    /// Human-readable amount.
    pub amount: Decimal,
    /// Gas limit sent with `eth_createAccessList`.
    pub access_list_gas_limit: Option<u64>,
    /// Sign and submit after the access-list step.
    pub send: bool,
    /// Receipt poll interval.
    pub poll_interval_ms: u64,
    /// Receipt deadline.
    pub receipt_timeout_ms: u64,
}

impl TransferPlan {
    /// A read-only self-transfer of `amount`.
    #[must_use]
    pub fn new(token: Address, from: Address, amount: Decimal) -> Self {
        Self {
            token,
            from,
            recipient: from,
            amount,
            access_list_gas_limit: None,
            send: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            receipt_timeout_ms: DEFAULT_RECEIPT_TIMEOUT_MS,
        }
    }

    /// Sets the recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = recipient;
        self
    }

    /// Sets the access-list gas limit.
    #[must_use]
    pub fn with_access_list_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.access_list_gas_limit = gas_limit;
        self
    }

    /// Enables sending with the given receipt polling parameters.
    #[must_use]
    pub fn sending(mut self, poll_interval_ms: u64, receipt_timeout_ms: u64) -> Self {
        self.send = true;
        self.poll_interval_ms = poll_interval_ms;
        self.receipt_timeout_ms = receipt_timeout_ms;
        self
    }
}

/// Outcome of [`Probe::run_transfer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// The simulated request.
    pub request: CallRequest,
    /// Transferred amount.
    pub amount: TokenAmount,
    /// Access-list result.
    pub access_list: AccessListOutcome,
    /// States visited.
    pub lifecycle: TxLifecycle,
    /// Hash, once submitted.
    pub tx_hash: Option<TxHash>,
    /// Receipt, once mined.
    pub receipt: Option<TxReceipt>,
}

impl TransferReport {
    /// Final state.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.lifecycle.state()
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "transfer:       {} -> {:?}", self.amount, self.request.to)?;
        writeln!(f, "simulation:     ok")?;
        match &self.access_list {
            AccessListOutcome::Available(result) => writeln!(
                f,
                "access list:    {} entries, {} storage keys, gasUsed {}",
                result.entries().len(),
                result.storage_key_count(),
                result.gas_used
            )?,
            AccessListOutcome::Unavailable { cause } => {
                writeln!(f, "access list:    unavailable ({cause})")?;
            }
        }
        if let Some(hash) = &self.tx_hash {
            writeln!(f, "tx hash:        {hash:?}")?;
        }
        if let Some(receipt) = &self.receipt {
            writeln!(
                f,
                "receipt:        {} in block {}, gasUsed {}",
                receipt.status, receipt.block_number, receipt.gas_used
            )?;
        }
        write!(f, "final state:    {}", self.state())
    }
}

/// Provider probe.
#[derive(Debug)]
pub struct Probe<P: JsonRpcClient = HttpTransport> {
    client: EthereumClient<P>,
}

impl<P: JsonRpcClient> Probe<P> {
    /// Creates a probe over `client`.
    #[must_use]
    pub fn new(client: EthereumClient<P>) -> Self {
        Self { client }
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &EthereumClient<P> {
        &self.client
    }

    /// Reads the holder's native balance and token snapshot concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first client error.
    pub async fn snapshot(&self, holder: Address, token: Address) -> ApplicationResult<Snapshot> {
        let (native_balance, token) = futures::try_join!(
            self.client.get_native_balance(holder),
            self.client.token_snapshot(token, holder),
        )?;
        Ok(Snapshot {
            chain: self.client.chain().clone(),
            holder,
            native_balance,
            token,
        })
    }

    /// Runs the transfer flow described in the module documentation.
    ///
    /// A receipt timeout ends the flow in [`TxState::TimedOut`] rather than
    /// failing it.
    ///
    /// # Errors
    ///
    /// - [`ApplicationError::Validation`] if `plan.send` is set without a
    ///   signing account
    /// - [`ApplicationError::Rpc`] for simulation, submission or polling
    ///   errors (a revert surfaces as [`RpcClientError::Revert`])
    pub async fn run_transfer(&self, plan: &TransferPlan) -> ApplicationResult<TransferReport> {
        if plan.send && !self.client.account().is_some_and(Account::can_sign) {
            return Err(ApplicationError::validation(
                "send mode requires an account derived from a mnemonic",
            ));
        }

        let mut lifecycle = TxLifecycle::new();
        let decimals = self.client.token_decimals(plan.token).await?;
        let request = self
            .client
            .simulate_transfer(plan.token, plan.from, plan.recipient, plan.amount, decimals)
            .await?;
        advance(&mut lifecycle, TxState::Simulated)?;

        let access_list = self
            .client
            .request_access_list(&request, plan.access_list_gas_limit)
            .await;
        let next = if access_list.is_available() {
            TxState::AccessListRequested
        } else {
            TxState::AccessListSkipped
        };
        advance(&mut lifecycle, next)?;

        let mut report = TransferReport {
            request,
            amount: TokenAmount::new(plan.amount, decimals),
            access_list,
            lifecycle,
            tx_hash: None,
            receipt: None,
        };
        if !plan.send {
            return Ok(report);
        }

        advance(&mut report.lifecycle, TxState::Submitted)?;
        let hash = self
            .client
            .submit_transaction(&report.request, report.access_list.access_list())
            .await?;
        report.tx_hash = Some(hash);
        advance(&mut report.lifecycle, TxState::Pending)?;

        match self
            .client
            .wait_for_receipt(hash, plan.poll_interval_ms, plan.receipt_timeout_ms)
            .await
        {
            Ok(receipt) => {
                let next = if receipt.is_success() {
                    TxState::Confirmed
                } else {
                    TxState::Failed
                };
                report.receipt = Some(receipt);
                advance(&mut report.lifecycle, next)?;
            }
            Err(RpcClientError::Timeout { .. }) => {
                advance(&mut report.lifecycle, TxState::TimedOut)?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(report)
    }
}

fn advance(lifecycle: &mut TxLifecycle, next: TxState) -> Result<(), InvalidTransition> {
    lifecycle.advance(next)?;
    info!(state = %next, "transfer state");
    Ok(())
}
