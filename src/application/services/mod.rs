//! # Application Services
//!
//! - [`Probe`]: snapshot and transfer workflow over the RPC client

pub mod probe;

pub use probe::{Probe, Snapshot, TransferPlan, TransferReport};
