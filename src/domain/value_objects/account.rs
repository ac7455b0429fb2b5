//! # Accounts
//!
//! Identities the client acts as.
//!
//! An [`Account`] is either a signing identity derived from a BIP-39 seed
//! phrase or a bare address. Only signing accounts may submit transactions;
//! address-only accounts are limited to read calls.

use ethers::signers::coins_bip39::English;
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use std::fmt;
use thiserror::Error;

/// Error type for account construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The seed phrase could not be turned into a key.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The address string is not a 20-byte hex address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Parses a `0x`-prefixed 20-byte hex address.
///
/// # Errors
///
/// Returns [`AccountError::InvalidAddress`] if the string is not an address.
pub fn parse_address(value: &str) -> Result<Address, AccountError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| AccountError::InvalidAddress(value.to_string()))
}

/// The identity used for calls and transactions.
#[derive(Clone)]
pub enum Account {
    /// Signing identity with a local private key.
    Signer(LocalWallet),
    /// Address used for read-only calls.
    ReadOnly(Address),
}

impl Account {
    /// Derives a signing account from a seed phrase.
    ///
    /// Uses the standard Ethereum derivation path `m/44'/60'/0'/0/{index}`.
    /// The wallet is bound to `chain_id` so signatures are replay-protected.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidMnemonic`] if the phrase is not a valid
    /// English BIP-39 mnemonic.
    pub fn from_mnemonic(phrase: &str, index: u32, chain_id: u64) -> Result<Self, AccountError> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .index(index)
            .map_err(|e| AccountError::InvalidMnemonic(e.to_string()))?
            .build()
            .map_err(|e| AccountError::InvalidMnemonic(e.to_string()))?;

        Ok(Self::Signer(wallet.with_chain_id(chain_id)))
    }

    /// Creates a read-only account for an address.
    #[must_use]
    pub const fn read_only(address: Address) -> Self {
        Self::ReadOnly(address)
    }

    /// Returns the account address.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::Signer(wallet) => wallet.address(),
            Self::ReadOnly(address) => *address,
        }
    }

    /// Returns true if the account can sign transactions.
    #[inline]
    #[must_use]
    pub const fn can_sign(&self) -> bool {
        matches!(self, Self::Signer(_))
    }

    /// Returns the signing wallet, if any.
    #[must_use]
    pub const fn wallet(&self) -> Option<&LocalWallet> {
        match self {
            Self::Signer(wallet) => Some(wallet),
            Self::ReadOnly(_) => None,
        }
    }
}

// Never print key material.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer(wallet) => f
                .debug_struct("Signer")
                .field("address", &wallet.address())
                .finish_non_exhaustive(),
            Self::ReadOnly(address) => f.debug_tuple("ReadOnly").field(address).finish(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.can_sign() { "signer" } else { "read-only" };
        write!(f, "{:?} ({mode})", self.address())
    }
}
