//! ETHx core library.
//!
//! Shared protocol code for discovering and controlling ETHx I/O modules:
//! the TCP command codec, the per-model capability table, and the UDP
//! discovery engine.

pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod types;

pub use config::{ClientConfig, ModuleConfig, ScanConfig};
pub use device::EthModule;
pub use discovery::{DiscoveryEngine, ScanObserver, ScanState};
pub use error::{CommandError, CoreError, DiscoveryError};
pub use types::{MacAddress, ModuleIdentity, ModuleKind, ScanResult, Status};
