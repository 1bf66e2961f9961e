//! UDP module discovery.
//!
//! Provides discovery reply decoding, observer fan-out, and the discovery engine.

pub mod observer;
pub mod packet;
pub mod service;

pub use observer::{ChannelObserver, ObserverRegistry, ScanObserver};
pub use packet::decode_packet;
pub use service::{DiscoveryEngine, ScanState};
