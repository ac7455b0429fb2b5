//! # Ethereum Client
//!
//! Provider-agnostic Ethereum JSON-RPC client.
//!
//! [`EthereumClient`] drives an ethers [`Provider`] over any
//! [`JsonRpcClient`] together with the chain metadata and an optional
//! [`Account`]. It never retries: every error is surfaced unmodified except
//! access-list misses, which come back as [`AccessListOutcome::Unavailable`],
//! and reverts of the dry-run calls, which become [`RpcClientError::Revert`].
//!
//! ```text
//! simulate_transfer ──► request_access_list ──► submit_transaction ──► wait_for_receipt
//!      eth_call          eth_createAccessList     eth_sendRawTransaction  eth_getTransactionReceipt
//! ```
//!
//! Signing happens locally with the account's key for the configured chain
//! id; the node never sees the key.

use super::access_list::{
    AccessListMissCause, AccessListOutcome, AccessListResult, CreateAccessListResponse,
    GasMisestimationPolicy, classify_miss,
};
use super::client::{CallRequest, TokenSnapshot, TxPriority, TxReceipt};
use super::erc20;
use super::error::{RpcClientError, RpcResult};
use super::gas::{
    FEE_HISTORY_BLOCKS, FEE_HISTORY_PERCENTILES, FeeHistory, GasEstimator, GasPrice,
};
use super::transport::HttpTransport;
use crate::domain::value_objects::{Account, ChainConfig, TokenAmount};
use ethers::abi::{self, ParamType, Token};
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip2930::{AccessList, Eip2930TransactionRequest};
use ethers::types::{
    Address, BlockNumber, Bytes, Eip1559TransactionRequest, TransactionRequest, TxHash, U256,
};
use ethers::utils;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Default per-request timeout for [`EthereumClient::new`].
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Ethereum JSON-RPC client.
#[derive(Debug)]
pub struct EthereumClient<P: JsonRpcClient = HttpTransport> {
    /// Chain metadata.
    chain: ChainConfig,
    /// ethers provider over the JSON-RPC transport.
    provider: Provider<P>,
    /// Signing or read-only identity.
    account: Option<Account>,
    /// Gas estimator with buffer.
    gas_estimator: GasEstimator,
    /// When an insufficient-funds answer counts as provider misestimation.
    misestimation_policy: GasMisestimationPolicy,
    /// Fee tier used when pricing transactions.
    priority: TxPriority,
}

impl EthereumClient<HttpTransport> {
    /// Creates a client over HTTP(S).
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain metadata
    /// * `rpc_url` - JSON-RPC endpoint URL
    /// * `account` - Optional signing or read-only account
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Configuration`] if the URL is empty,
    /// unparsable or not http/https.
    pub fn new(chain: ChainConfig, rpc_url: &str, account: Option<Account>) -> RpcResult<Self> {
        Self::with_timeout(chain, rpc_url, account, DEFAULT_REQUEST_TIMEOUT_MS)
    }

    /// Creates a client over HTTP(S) with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Configuration`] for a bad URL.
    pub fn with_timeout(
        chain: ChainConfig,
        rpc_url: &str,
        account: Option<Account>,
        timeout_ms: u64,
    ) -> RpcResult<Self> {
        let transport = HttpTransport::new(rpc_url, timeout_ms)?;
        Ok(Self::with_transport(chain, transport, account))
    }
}

impl<P: JsonRpcClient> EthereumClient<P> {
    /// Creates a client over any JSON-RPC transport.
    #[must_use]
    pub fn with_transport(chain: ChainConfig, transport: P, account: Option<Account>) -> Self {
        Self {
            chain,
            provider: Provider::new(transport),
            account,
            gas_estimator: GasEstimator::default(),
            misestimation_policy: GasMisestimationPolicy::default(),
            priority: TxPriority::default(),
        }
    }

    /// Sets the gas-limit buffer percentage.
    #[must_use]
    pub fn with_gas_buffer(mut self, buffer_percent: u64) -> Self {
        self.gas_estimator = GasEstimator::new(buffer_percent);
        self
    }

    /// Sets the access-list misestimation policy.
    #[must_use]
    pub fn with_misestimation_policy(mut self, policy: GasMisestimationPolicy) -> Self {
        self.misestimation_policy = policy;
        self
    }

    /// Sets the fee tier.
    #[must_use]
    pub fn with_priority(mut self, priority: TxPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the chain metadata.
    #[must_use]
    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Returns the configured account.
    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// Returns the underlying provider.
    #[must_use]
    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }

    /// Returns the gas estimator.
    #[must_use]
    pub fn gas_estimator(&self) -> &GasEstimator {
        &self.gas_estimator
    }

    /// Returns the endpoint's chain id (`eth_chainId`).
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn chain_id(&self) -> RpcResult<u64> {
        let id = self.provider.get_chainid().await?;
        to_u64(id, "eth_chainId")
    }

    /// Returns the latest block number.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn block_number(&self) -> RpcResult<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    /// Returns the native balance of `address` in wei.
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::Network`] on transport failure
    /// - [`RpcClientError::Rpc`] when the node returns an error object
    /// - [`RpcClientError::Decode`] when the result is not a `0x` hex quantity
    pub async fn get_native_balance(&self, address: Address) -> RpcResult<U256> {
        // U256's deserializer also takes unprefixed hex, so the raw string is
        // checked here.
        let raw: String = self
            .provider
            .request(
                "eth_getBalance",
                [utils::serialize(&address), utils::serialize(&BlockNumber::Latest)],
            )
            .await?;
        parse_quantity(&raw)
            .map_err(|e| RpcClientError::decode(format!("invalid eth_getBalance result: {e}")))
    }

    /// Calls a contract and decodes the return data as `outputs`.
    ///
    /// # Arguments
    ///
    /// * `to` - Contract address
    /// * `data` - Selector and ABI-encoded arguments
    /// * `outputs` - Expected return types
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::Rpc`] for node errors, reverts included, verbatim
    /// - [`RpcClientError::Decode`] if the return data does not match
    ///   `outputs`, including empty data for non-empty `outputs`
    pub async fn read_contract(
        &self,
        to: Address,
        data: Bytes,
        outputs: &[ParamType],
    ) -> RpcResult<Vec<Token>> {
        let raw = self.read(to, data).await?;
        decode_return(&raw, outputs)
    }

    async fn read(&self, to: Address, data: Bytes) -> RpcResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        Ok(self.provider.call(&tx, None).await?)
    }

    /// Reads `symbol()`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_contract`].
    pub async fn token_symbol(&self, token: Address) -> RpcResult<String> {
        let raw = self.read(token, erc20::symbol_call()).await?;
        erc20::decode_string_or_bytes32(&raw)
            .ok_or_else(|| RpcClientError::decode(format!("invalid symbol() return data from {token:?}")))
    }

    /// Reads `decimals()`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_contract`]; values above 255 are a decode error.
    pub async fn token_decimals(&self, token: Address) -> RpcResult<u8> {
        let tokens = self
            .read_contract(token, erc20::decimals_call(), &[ParamType::Uint(8)])
            .await?;
        let value = single_uint(tokens, "decimals()")?;
        if value.bits() > 8 {
            return Err(RpcClientError::decode(format!("decimals() returned {value}")));
        }
        u8::try_from(value.low_u64())
            .map_err(|_| RpcClientError::decode(format!("decimals() returned {value}")))
    }

    /// Reads `balanceOf(holder)` in base units.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_contract`].
    pub async fn token_balance(&self, token: Address, holder: Address) -> RpcResult<U256> {
        let tokens = self
            .read_contract(token, erc20::balance_of_call(holder), &[ParamType::Uint(256)])
            .await?;
        single_uint(tokens, "balanceOf(address)")
    }

    /// Reads symbol, decimals and the holder's balance concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error among the three reads.
    pub async fn token_snapshot(&self, token: Address, holder: Address) -> RpcResult<TokenSnapshot> {
        let (symbol, decimals, balance) = futures::try_join!(
            self.token_symbol(token),
            self.token_decimals(token),
            self.token_balance(token, holder),
        )?;
        Ok(TokenSnapshot {
            token,
            holder,
            symbol,
            decimals,
            balance,
        })
    }

    /// Dry-runs an ERC-20 `transfer` and returns the ready-to-send request.
    ///
    /// # Arguments
    ///
    /// * `token` - Token contract
    /// * `from` - Sender
    /// * `to` - Recipient
    /// * `amount` - Human-readable amount
    /// * `decimals` - Token decimals
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::InvalidArgument`] if `amount` is negative or too precise
    /// - [`RpcClientError::Revert`] if the dry run reverts or returns `false`
    /// - `Network`, `Rpc` or `Decode` errors otherwise
    pub async fn simulate_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: Decimal,
        decimals: u8,
    ) -> RpcResult<CallRequest> {
        let base_units = TokenAmount::new(amount, decimals)
            .to_base_units()
            .map_err(|e| RpcClientError::invalid_argument(e.to_string()))?;
        let request = CallRequest::new(from, token, erc20::transfer_call(to, base_units));

        let raw = self
            .provider
            .call(&request.to_transaction(None), None)
            .await
            .map_err(|e| RpcClientError::from(e).into_revert_if_reverted())?;
        // Tokens that predate the standard return nothing on success.
        if !raw.is_empty() {
            match decode_return(&raw, &[ParamType::Bool])?.into_iter().next() {
                Some(Token::Bool(true)) => {}
                _ => return Err(RpcClientError::revert("transfer returned false")),
            }
        }

        debug!(%token, %from, %to, %base_units, "transfer simulation succeeded");
        Ok(request)
    }

    /// Returns a buffered `eth_estimateGas` for `request`, ignoring its own
    /// gas limit.
    ///
    /// # Errors
    ///
    /// [`RpcClientError::Revert`] if estimation reverts, `Network`, `Rpc` or
    /// `Decode` errors otherwise.
    pub async fn estimate_gas(&self, request: &CallRequest) -> RpcResult<u64> {
        let unbounded = CallRequest {
            gas: None,
            ..request.clone()
        };
        let estimate = self
            .provider
            .estimate_gas(&unbounded.to_transaction(None), None)
            .await
            .map_err(|e| RpcClientError::from(e).into_revert_if_reverted())?;
        let raw = to_u64(estimate, "eth_estimateGas")?;
        let buffered = self.gas_estimator.apply_buffer(raw);
        debug!(raw, buffered, "estimated gas");
        Ok(buffered)
    }

    /// Fills the request's gas limit from [`Self::estimate_gas`] when unset.
    ///
    /// # Errors
    ///
    /// Same as [`Self::estimate_gas`].
    pub async fn with_gas_estimate(&self, request: CallRequest) -> RpcResult<CallRequest> {
        match request.gas {
            Some(_) => Ok(request),
            None => {
                let gas = self.estimate_gas(&request).await?;
                Ok(request.with_gas(gas))
            }
        }
    }

    /// Requests an EIP-2930 access list for `request`.
    ///
    /// `gas_limit`, or else `request.gas`, is sent as the call's `gas` field,
    /// which keeps the provider from running its own estimation. Every miss
    /// is logged at `warn` with its cause.
    pub async fn request_access_list(
        &self,
        request: &CallRequest,
        gas_limit: Option<u64>,
    ) -> AccessListOutcome {
        let gas = gas_limit.or(request.gas);
        let tx = request.to_transaction(gas);
        let outcome = match self
            .provider
            .request::<_, CreateAccessListResponse>(
                "eth_createAccessList",
                [utils::serialize(&tx), utils::serialize(&BlockNumber::Latest)],
            )
            .await
        {
            Ok(response) => access_list_outcome(response),
            Err(error) => AccessListOutcome::Unavailable {
                cause: classify_miss(
                    error.into(),
                    request.value,
                    gas.is_some(),
                    &self.misestimation_policy,
                ),
            },
        };

        match &outcome {
            AccessListOutcome::Available(result) => debug!(
                entries = result.entries().len(),
                storage_keys = result.storage_key_count(),
                gas_used = %result.gas_used,
                "access list available"
            ),
            AccessListOutcome::Unavailable { cause } => warn!(
                chain_id = self.chain.chain_id,
                kind = cause.label(),
                cause = %cause,
                "access list unavailable, continuing without one"
            ),
        }
        outcome
    }

    /// Returns the pending nonce of `address`.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn nonce(&self, address: Address) -> RpcResult<u64> {
        let count = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await?;
        to_u64(count, "eth_getTransactionCount")
    }

    /// Returns the node's legacy gas price.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn node_gas_price(&self) -> RpcResult<U256> {
        Ok(self.provider.get_gas_price().await?)
    }

    /// Returns recent base fees and reward percentiles.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn fee_history(&self) -> RpcResult<FeeHistory> {
        // Middleware::fee_history re-sends on any error with the pre-1.10.7
        // block count encoding.
        let history: ethers::types::FeeHistory = self
            .provider
            .request(
                "eth_feeHistory",
                [
                    utils::serialize(&U256::from(FEE_HISTORY_BLOCKS)),
                    utils::serialize(&BlockNumber::Latest),
                    utils::serialize(&FEE_HISTORY_PERCENTILES),
                ],
            )
            .await?;
        Ok(history.into())
    }

    /// Prices a transaction for the configured priority.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn gas_price(&self) -> RpcResult<GasPrice> {
        if self.chain.eip1559 {
            Ok(self.fee_history().await?.gas_price(self.priority))
        } else {
            let node_price = self.node_gas_price().await?;
            Ok(GasPrice::legacy_for_priority(node_price, self.priority))
        }
    }

    fn signer_for(&self, from: Address) -> RpcResult<&LocalWallet> {
        match &self.account {
            Some(account) => match account.wallet() {
                Some(wallet) if wallet.address() == from => Ok(wallet),
                Some(wallet) => Err(RpcClientError::unauthorized(format!(
                    "signer {:?} does not match sender {from:?}",
                    wallet.address()
                ))),
                None => Err(RpcClientError::unauthorized(format!(
                    "account {account} is read-only"
                ))),
            },
            None => Err(RpcClientError::unauthorized("no account configured")),
        }
    }

    fn build_transaction(
        &self,
        request: &CallRequest,
        nonce: u64,
        gas: u64,
        price: GasPrice,
        access_list: Option<&AccessList>,
    ) -> TypedTransaction {
        match price {
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut tx = Eip1559TransactionRequest::new()
                    .from(request.from)
                    .to(request.to)
                    .data(request.data.clone())
                    .value(request.value)
                    .nonce(nonce)
                    .gas(gas)
                    .max_fee_per_gas(max_fee_per_gas)
                    .max_priority_fee_per_gas(max_priority_fee_per_gas)
                    .chain_id(self.chain.chain_id);
                if let Some(list) = access_list {
                    tx = tx.access_list(list.clone());
                }
                tx.into()
            }
            GasPrice::Legacy { gas_price } => {
                let tx = TransactionRequest::new()
                    .from(request.from)
                    .to(request.to)
                    .data(request.data.clone())
                    .value(request.value)
                    .nonce(nonce)
                    .gas(gas)
                    .gas_price(gas_price)
                    .chain_id(self.chain.chain_id);
                match access_list {
                    Some(list) => Eip2930TransactionRequest::new(tx, list.clone()).into(),
                    None => tx.into(),
                }
            }
        }
    }

    /// Signs `request` locally and submits it.
    ///
    /// Fetches the pending nonce, prices gas, fills a missing gas limit and
    /// attaches `access_list` when given.
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::Unauthorized`] without a signing account whose
    ///   address equals `request.from`, before any request is sent
    /// - [`RpcClientError::Signing`] if local signing fails
    /// - `Network`, `Rpc`, `Revert` or `Decode` errors from the node
    pub async fn submit_transaction(
        &self,
        request: &CallRequest,
        access_list: Option<&AccessList>,
    ) -> RpcResult<TxHash> {
        let wallet = self.signer_for(request.from)?;

        let nonce = self.nonce(request.from).await?;
        let gas = match request.gas {
            Some(gas) => gas,
            None => self.estimate_gas(request).await?,
        };
        let price = self.gas_price().await?;
        let tx = self.build_transaction(request, nonce, gas, price, access_list);

        let signature = wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| RpcClientError::Signing(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);

        let hash = self.provider.send_raw_transaction(raw).await?.tx_hash();
        info!(
            tx_hash = ?hash,
            nonce,
            gas,
            price = %price,
            access_list = access_list.is_some(),
            "transaction submitted"
        );
        Ok(hash)
    }

    /// Returns the receipt for `hash`, or `None` while pending.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Rpc` or `Decode` errors.
    pub async fn get_receipt(&self, hash: TxHash) -> RpcResult<Option<TxReceipt>> {
        self.provider
            .get_transaction_receipt(hash)
            .await?
            .map(TxReceipt::try_from)
            .transpose()
    }

    async fn poll_receipt(&self, hash: TxHash, interval: Duration) -> RpcResult<TxReceipt> {
        loop {
            if let Some(receipt) = self.get_receipt(hash).await? {
                return Ok(receipt);
            }
            sleep(interval).await;
        }
    }

    /// Polls for the receipt of `hash` every `poll_interval_ms` until it is
    /// available or `timeout_ms` elapses.
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::InvalidArgument`] for a zero poll interval
    /// - [`RpcClientError::Timeout`] when the deadline passes
    /// - transport and node errors from polling, unmodified
    pub async fn wait_for_receipt(
        &self,
        hash: TxHash,
        poll_interval_ms: u64,
        timeout_ms: u64,
    ) -> RpcResult<TxReceipt> {
        if poll_interval_ms == 0 {
            return Err(RpcClientError::invalid_argument(
                "poll interval must be positive",
            ));
        }
        let receipt = timeout(
            Duration::from_millis(timeout_ms),
            self.poll_receipt(hash, Duration::from_millis(poll_interval_ms)),
        )
        .await
        .map_err(|_| RpcClientError::timeout(format!("receipt of {hash:?}"), timeout_ms))??;

        info!(
            tx_hash = ?hash,
            status = %receipt.status,
            block = receipt.block_number,
            gas_used = %receipt.gas_used,
            "receipt received"
        );
        Ok(receipt)
    }

    /// Verifies the endpoint serves the configured chain and returns its
    /// latest block number.
    ///
    /// # Errors
    ///
    /// [`RpcClientError::Configuration`] on a chain id mismatch, `Network`,
    /// `Rpc` or `Decode` errors otherwise.
    pub async fn health_check(&self) -> RpcResult<u64> {
        let (remote, block) = futures::try_join!(self.chain_id(), self.block_number())?;
        if remote != self.chain.chain_id {
            return Err(RpcClientError::configuration(format!(
                "endpoint serves chain {remote}, expected {} ({})",
                self.chain.chain_id, self.chain.name
            )));
        }
        debug!(chain_id = remote, block, "endpoint healthy");
        Ok(block)
    }
}

/// Parses a JSON-RPC quantity: a `0x`-prefixed, non-negative hex integer.
fn parse_quantity(text: &str) -> Result<U256, String> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| format!("missing 0x prefix in {text:?}"))?;
    if digits.is_empty() || digits.len() > 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("not a hex quantity: {text:?}"));
    }
    U256::from_str_radix(digits, 16).map_err(|e| format!("{text:?}: {e}"))
}

fn to_u64(value: U256, method: &str) -> RpcResult<u64> {
    u64::try_from(value)
        .map_err(|_| RpcClientError::decode(format!("{method} result {value} exceeds u64")))
}

fn access_list_outcome(response: CreateAccessListResponse) -> AccessListOutcome {
    match response.error {
        Some(reason) => AccessListOutcome::Unavailable {
            cause: AccessListMissCause::ExecutionFailed { reason },
        },
        None => AccessListOutcome::Available(AccessListResult {
            access_list: response.access_list,
            gas_used: response.gas_used,
        }),
    }
}

fn decode_return(raw: &[u8], outputs: &[ParamType]) -> RpcResult<Vec<Token>> {
    if raw.is_empty() && !outputs.is_empty() {
        return Err(RpcClientError::decode("empty return data"));
    }
    abi::decode(outputs, raw).map_err(|e| RpcClientError::decode(format!("invalid return data: {e}")))
}

fn single_uint(tokens: Vec<Token>, method: &str) -> RpcResult<U256> {
    match tokens.into_iter().next() {
        Some(Token::Uint(value)) => Ok(value),
        other => Err(RpcClientError::decode(format!(
            "{method} returned {other:?}"
        ))),
    }
}
