//! # Domain
//!
//! Networks, accounts, token amounts and the transaction lifecycle.

pub mod value_objects;
