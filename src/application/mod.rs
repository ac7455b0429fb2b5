//! # Application
//!
//! Use cases built on the domain and infrastructure layers.

pub mod error;
pub mod services;
