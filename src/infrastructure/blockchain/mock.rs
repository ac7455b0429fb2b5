//! In-memory [`JsonRpcClient`] answering by JSON-RPC method.

use super::erc20::{self, BALANCE_OF, DECIMALS, SYMBOL, TRANSFER};
use super::error::{RpcClientError, RpcResult};
use super::transport::{TransportError, positional_params};
use async_trait::async_trait;
use ethers::abi::{self, ParamType, Token};
use ethers::providers::{JsonRpcClient, JsonRpcError};
use ethers::types::U256;
use ethers::utils::hex;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

type Responder = Box<dyn Fn(&Value) -> RpcResult<Value> + Send + Sync>;

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<RpcResult<Value>>>,
    responders: HashMap<String, Responder>,
    calls: Vec<(String, Value)>,
}

/// Scripted transport. Queued responses are consumed first, then the fixed
/// responder for the method. Unknown methods fail with `-32601`.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Always answers `method` with `result`.
    pub(crate) fn on(&self, method: &str, result: Value) -> &Self {
        self.on_with(method, move |_| Ok(result.clone()))
    }

    /// Always fails `method` with `error`.
    pub(crate) fn on_error(&self, method: &str, error: RpcClientError) -> &Self {
        self.on_with(method, move |_| Err(error.clone()))
    }

    /// Answers `method` by calling `responder` with the request params.
    pub(crate) fn on_with<F>(&self, method: &str, responder: F) -> &Self
    where
        F: Fn(&Value) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .responders
            .insert(method.to_string(), Box::new(responder));
        self
    }

    /// Queues a one-shot response for `method`.
    pub(crate) fn push(&self, method: &str, response: RpcResult<Value>) -> &Self {
        self.state
            .lock()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Answers `eth_call` like an ERC-20 where every holder owns `balance`.
    /// Transfers above the balance revert with the OpenZeppelin reason.
    pub(crate) fn erc20(&self, symbol: &str, decimals: u8, balance: U256) -> &Self {
        let symbol = symbol.to_string();
        self.on_with("eth_call", move |params| {
            let data = params
                .get(0)
                .and_then(|call| call.get("data"))
                .and_then(Value::as_str)
                .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok())
                .ok_or_else(|| RpcClientError::rpc(-32602, "missing call data"))?;
            let (sel, args) = erc20::split_selector(&data)
                .ok_or_else(|| RpcClientError::rpc(3, "execution reverted"))?;

            let out = if sel == erc20::selector(SYMBOL) {
                abi::encode(&[Token::String(symbol.clone())])
            } else if sel == erc20::selector(DECIMALS) {
                abi::encode(&[Token::Uint(decimals.into())])
            } else if sel == erc20::selector(BALANCE_OF) {
                abi::encode(&[Token::Uint(balance)])
            } else if sel == erc20::selector(TRANSFER) {
                let amount = match abi::decode(&[ParamType::Address, ParamType::Uint(256)], args)
                    .ok()
                    .and_then(|tokens| tokens.into_iter().nth(1))
                {
                    Some(Token::Uint(amount)) => amount,
                    _ => return Err(RpcClientError::rpc(3, "execution reverted")),
                };
                if amount > balance {
                    let reason = "ERC20: transfer amount exceeds balance";
                    return Err(RpcClientError::Rpc {
                        code: 3,
                        message: format!("execution reverted: {reason}"),
                        data: Some(hex_value(&erc20::encode_revert_reason(reason))),
                    });
                }
                abi::encode(&[Token::Bool(true)])
            } else {
                return Err(RpcClientError::rpc(3, "execution reverted"));
            };
            Ok(hex_value(&out))
        })
    }

    /// Every request so far, in order.
    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().calls.clone()
    }

    /// Params of every request to `method`.
    pub(crate) fn calls_to(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn respond(&self, method: &str, params: Value) -> RpcResult<Value> {
        let mut state = self.state.lock();
        state.calls.push((method.to_string(), params.clone()));
        if let Some(response) = state.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return response;
        }
        match state.responders.get(method) {
            Some(responder) => responder(&params),
            None => Err(RpcClientError::rpc(
                -32601,
                format!("the method {method} does not exist/is not available"),
            )),
        }
    }
}

/// `0x`-prefixed hex JSON string.
pub(crate) fn hex_value(bytes: &[u8]) -> Value {
    json!(format!("0x{}", hex::encode(bytes)))
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.state.lock().calls.len())
            .finish()
    }
}

/// Scripted errors cross the provider the way the HTTP transport's would.
fn to_transport_error(error: RpcClientError) -> TransportError {
    match error {
        RpcClientError::Rpc {
            code,
            message,
            data,
        } => TransportError::JsonRpc(JsonRpcError {
            code,
            message,
            data,
        }),
        RpcClientError::Decode(message) => TransportError::Serde(serde_json::Error::custom(message)),
        RpcClientError::Network(message) => TransportError::Network(message),
        other => TransportError::Network(other.to_string()),
    }
}

#[async_trait]
impl JsonRpcClient for MockTransport {
    type Error = TransportError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, TransportError>
    where
        T: fmt::Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let result = self
            .respond(method, positional_params(&params)?)
            .map_err(to_transport_error)?;
        Ok(serde_json::from_value(result)?)
    }
}
