//! Device communication layer.
//!
//! Provides the TCP command connection to a single module.

pub mod connection;

pub use connection::EthModule;
