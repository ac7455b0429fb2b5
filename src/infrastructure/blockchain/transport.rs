//! # JSON-RPC Transport
//!
//! JSON-RPC 2.0 envelope handling over HTTP(S).
//!
//! [`HttpTransport`] implements ethers' [`JsonRpcClient`], so the client
//! drives it through an [`ethers::providers::Provider`]. Failures come back as
//! a [`TransportError`]:
//!
//! - connect failures, timeouts and non-2xx responses without a JSON-RPC
//!   error body become [`TransportError::Network`]
//! - JSON-RPC error objects become [`TransportError::JsonRpc`], verbatim
//! - unparsable bodies become [`TransportError::Serde`]
//!
//! [`RpcClientError`] converts from the provider error so the classification
//! survives the trip through the provider.
//!
//! # Examples
//!
//! ```ignore
//! use ethers::providers::{Middleware, Provider};
//! use rpc_probe::infrastructure::blockchain::transport::HttpTransport;
//!
//! let provider = Provider::new(HttpTransport::new("https://mainnet.base.org", 10_000)?);
//! let block = provider.get_block_number().await?;
//! ```

use super::error::{RpcClientError, RpcResult};
use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, JsonRpcError, ProviderError, RpcError};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Failure of a single JSON-RPC exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The node answered with a JSON-RPC error object.
    #[error(transparent)]
    JsonRpc(#[from] JsonRpcError),

    /// Connect failure, timeout, or non-2xx without a JSON-RPC error body.
    #[error("{0}")]
    Network(String),

    /// The body or its `result` member did not have the expected shape.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl RpcError for TransportError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Self::JsonRpc(error) => Some(error),
            _ => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(error: TransportError) -> Self {
        Self::JsonRpcClientError(Box::new(error))
    }
}

impl From<ProviderError> for RpcClientError {
    fn from(error: ProviderError) -> Self {
        if let Some(response) = error.as_error_response() {
            return Self::Rpc {
                code: response.code,
                message: response.message.clone(),
                data: response.data.clone(),
            };
        }
        if let Some(serde) = error.as_serde_error() {
            return Self::decode(format!("invalid response: {serde}"));
        }
        Self::network(error.to_string())
    }
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn into_result(self) -> Result<Value, TransportError> {
        match self.error {
            Some(error) => Err(TransportError::JsonRpc(error)),
            None => Ok(self.result),
        }
    }
}

/// Positional params for a request. ethers passes `()` for methods without
/// arguments, which serializes to `null`; the wire wants `[]`.
pub(crate) fn positional_params<T: Serialize>(params: &T) -> Result<Value, TransportError> {
    match serde_json::to_value(params)? {
        Value::Null => Ok(json!([])),
        value => Ok(value),
    }
}

/// HTTP(S) JSON-RPC transport.
#[derive(Debug)]
pub struct HttpTransport {
    /// Inner reqwest client.
    client: Client,
    /// Endpoint URL.
    url: Url,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
    /// Next JSON-RPC request id.
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Creates a transport for `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - HTTP(S) endpoint URL
    /// * `timeout_ms` - Per-request timeout in milliseconds
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Configuration`] if the URL is empty, does not
    /// parse, is not http/https, or the HTTP client cannot be built.
    pub fn new(url: &str, timeout_ms: u64) -> RpcResult<Self> {
        let url = parse_endpoint(url)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| {
                RpcClientError::configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            url,
            timeout_ms,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn map_reqwest_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Network(format!("request timed out after {}ms", self.timeout_ms))
        } else if error.is_connect() {
            TransportError::Network(format!("connection failed: {error}"))
        } else {
            TransportError::Network(format!("HTTP request failed: {error}"))
        }
    }

    /// Maps a non-2xx response. A JSON-RPC error body wins over the status.
    fn map_status_error(status: StatusCode, body: &[u8]) -> TransportError {
        if let Ok(response) = serde_json::from_slice::<JsonRpcResponse>(body)
            && let Some(error) = response.error
        {
            return TransportError::JsonRpc(error);
        }
        let text = String::from_utf8_lossy(body);
        TransportError::Network(format!("HTTP {status}: {}", text.trim()))
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "sending JSON-RPC request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(&e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(&e))?;

        if !status.is_success() {
            return Err(Self::map_status_error(status, &bytes));
        }

        let envelope: JsonRpcResponse = serde_json::from_slice(&bytes)?;
        trace!(method, id, response_id = %envelope.id, "received JSON-RPC response");
        envelope.into_result()
    }
}

/// Validates an endpoint URL.
///
/// # Errors
///
/// Returns [`RpcClientError::Configuration`] for empty, unparsable or
/// non-HTTP URLs.
pub fn parse_endpoint(url: &str) -> RpcResult<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(RpcClientError::configuration("RPC URL is empty"));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|e| RpcClientError::configuration(format!("invalid RPC URL '{trimmed}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RpcClientError::configuration(format!(
            "unsupported RPC URL scheme '{other}'"
        ))),
    }
}

#[async_trait]
impl JsonRpcClient for HttpTransport {
    type Error = TransportError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, TransportError>
    where
        T: fmt::Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let result = self.send(method, positional_params(&params)?).await?;
        Ok(serde_json::from_value(result)?)
    }
}
