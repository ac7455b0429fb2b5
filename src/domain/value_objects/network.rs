//! # Networks
//!
//! Known networks and the immutable chain metadata handed to the RPC client.
//!
//! A [`Network`] is a selector resolved by configuration. The client itself
//! only ever sees a [`ChainConfig`], so custom chains work as long as their
//! metadata is supplied.
//!
//! # Examples
//!
//! ```
//! use rpc_probe::domain::value_objects::network::Network;
//!
//! let network: Network = "base".parse().unwrap();
//! assert_eq!(network.chain_id(), 8453);
//! assert_eq!(network.chain_config().native_currency_symbol, "ETH");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by every EVM native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet (chain ID 1).
    Ethereum,
    /// Polygon PoS (chain ID 137).
    Polygon,
    /// Arbitrum One (chain ID 42161).
    Arbitrum,
    /// Optimism mainnet (chain ID 10).
    Optimism,
    /// Base mainnet (chain ID 8453).
    Base,
    /// Celo mainnet (chain ID 42220).
    Celo,
}

impl Network {
    /// All known networks.
    pub const ALL: [Self; 6] = [
        Self::Ethereum,
        Self::Polygon,
        Self::Arbitrum,
        Self::Optimism,
        Self::Base,
        Self::Celo,
    ];

    /// Returns the numeric chain ID.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Polygon => 137,
            Self::Arbitrum => 42161,
            Self::Optimism => 10,
            Self::Base => 8453,
            Self::Celo => 42220,
        }
    }

    /// Resolves a network from a numeric chain ID.
    #[must_use]
    pub const fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::Ethereum),
            137 => Some(Self::Polygon),
            42161 => Some(Self::Arbitrum),
            10 => Some(Self::Optimism),
            8453 => Some(Self::Base),
            42220 => Some(Self::Celo),
            _ => None,
        }
    }

    /// Returns the network name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Base => "base",
            Self::Celo => "celo",
        }
    }

    /// Returns the native currency symbol.
    #[must_use]
    pub const fn native_currency_symbol(&self) -> &'static str {
        match self {
            Self::Polygon => "POL",
            Self::Celo => "CELO",
            Self::Ethereum | Self::Arbitrum | Self::Optimism | Self::Base => "ETH",
        }
    }

    /// Returns the public RPC endpoint used when no override is configured.
    #[must_use]
    pub const fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Ethereum => "https://ethereum-rpc.publicnode.com",
            Self::Polygon => "https://polygon-rpc.com",
            Self::Arbitrum => "https://arb1.arbitrum.io/rpc",
            Self::Optimism => "https://mainnet.optimism.io",
            Self::Base => "https://mainnet.base.org",
            Self::Celo => "https://forno.celo.org",
        }
    }

    /// Returns the canonical USDC contract address on this network.
    #[must_use]
    pub const fn usdc_address(&self) -> &'static str {
        match self {
            Self::Ethereum => "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            Self::Polygon => "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
            Self::Arbitrum => "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
            Self::Optimism => "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
            Self::Base => "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
            Self::Celo => "0xcebA9300f2b948710d2653dD7B07f33A8B32118C",
        }
    }

    /// Returns the average block time in milliseconds.
    #[must_use]
    pub const fn block_time_ms(&self) -> u64 {
        match self {
            Self::Ethereum => 12000,
            Self::Arbitrum => 250,
            Self::Celo => 1000,
            Self::Polygon | Self::Optimism | Self::Base => 2000,
        }
    }

    /// Returns whether EIP-1559 fee pricing is used.
    #[must_use]
    pub const fn supports_eip1559(&self) -> bool {
        !matches!(self, Self::Arbitrum)
    }

    /// Returns the chain metadata for this network.
    #[must_use]
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            chain_id: self.chain_id(),
            name: self.name().to_string(),
            native_currency_symbol: self.native_currency_symbol().to_string(),
            native_currency_decimals: NATIVE_DECIMALS,
            eip1559: self.supports_eip1559(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a network selector cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetworkError(pub String);

impl FromStr for Network {
    type Err = UnknownNetworkError;

    /// Accepts a network name, a common alias or a numeric chain ID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if let Ok(id) = normalized.parse::<u64>() {
            return Self::from_chain_id(id).ok_or_else(|| UnknownNetworkError(s.to_string()));
        }
        match normalized.as_str() {
            "ethereum" | "mainnet" | "eth" => Ok(Self::Ethereum),
            "polygon" | "matic" => Ok(Self::Polygon),
            "arbitrum" | "arbitrum-one" | "arb" => Ok(Self::Arbitrum),
            "optimism" | "op" => Ok(Self::Optimism),
            "base" => Ok(Self::Base),
            "celo" => Ok(Self::Celo),
            _ => Err(UnknownNetworkError(s.to_string())),
        }
    }
}

/// Chain metadata supplied to the client at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Numeric chain ID, used for replay-protected signing.
    pub chain_id: u64,
    /// Human-readable chain name.
    pub name: String,
    /// Native currency symbol (e.g. "ETH").
    pub native_currency_symbol: String,
    /// Native currency decimals.
    pub native_currency_decimals: u8,
    /// Whether transactions are priced with EIP-1559 dynamic fees.
    pub eip1559: bool,
}

impl ChainConfig {
    /// Creates metadata for an arbitrary chain with 18-decimal native currency
    /// and EIP-1559 pricing.
    #[must_use]
    pub fn new(chain_id: u64, native_currency_symbol: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: format!("chain-{chain_id}"),
            native_currency_symbol: native_currency_symbol.into(),
            native_currency_decimals: NATIVE_DECIMALS,
            eip1559: true,
        }
    }

    /// Sets the chain name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Switches the chain to legacy gas pricing.
    #[must_use]
    pub fn with_legacy_pricing(mut self) -> Self {
        self.eip1559 = false;
        self
    }
}

impl From<Network> for ChainConfig {
    fn from(network: Network) -> Self {
        network.chain_config()
    }
}
