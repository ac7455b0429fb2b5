//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! - [`Network`], [`ChainConfig`]: network selection and chain metadata
//! - [`Account`]: signing identity or read-only address
//! - [`TokenAmount`]: exact decimal ⇄ base-unit conversion
//! - [`TxState`], [`TxLifecycle`]: transaction lifecycle state machine

pub mod account;
pub mod network;
pub mod token_amount;
pub mod tx_state;

pub use account::{Account, AccountError, parse_address};
pub use network::{ChainConfig, Network, UnknownNetworkError};
pub use token_amount::{AmountError, TokenAmount, format_units};
pub use tx_state::{InvalidTransition, TxLifecycle, TxState};
