//! Module access layer.
//!
//! TCP sessions and the discovery engine are provided by ethx-core.
//! This module provides CLI-specific discovery wrappers.

pub mod discovery;
