//! Protocol layer for module communication.
//!
//! This module handles framing commands and sizing replies for ETHx modules.

pub mod capabilities;
pub mod codec;
pub mod commands;

pub use capabilities::Capabilities;
pub use codec::{execute, CommandRequest};
pub use commands::Opcode;
