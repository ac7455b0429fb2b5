//! # rpc-probe
//!
//! Provider-agnostic Ethereum JSON-RPC client and a probe that compares how
//! providers answer the same requests.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain`): networks, accounts, token amounts and the transaction lifecycle
//! - **Application Layer** (`application`): the probe workflow
//! - **Infrastructure Layer** (`infrastructure`): JSON-RPC transport and client
//! - **Configuration** (`config`): defaults, TOML file and environment overrides
//!
//! ## Example
//!
//! ```rust,ignore
//! use rpc_probe::application::services::{Probe, TransferPlan};
//! use rpc_probe::domain::value_objects::{Account, Network};
//! use rpc_probe::infrastructure::blockchain::EthereumClient;
//!
//! let network = Network::Base;
//! let holder = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse()?;
//! let client = EthereumClient::new(network.into(), network.default_rpc_url(), Some(Account::read_only(holder)))?;
//! let probe = Probe::new(client);
//!
//! let token = network.usdc_address().parse()?;
//! println!("{}", probe.snapshot(holder, token).await?);
//! let report = probe
//!     .run_transfer(&TransferPlan::new(token, holder, "0.01".parse()?))
//!     .await?;
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
