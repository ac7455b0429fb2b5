//! # Infrastructure
//!
//! Adapters to external systems.

pub mod blockchain;
