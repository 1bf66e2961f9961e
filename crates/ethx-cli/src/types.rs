//! Report types printed by the CLI.

use ethx_core::types::ModuleIdentity;
use serde::Serialize;

/// Everything `info` reads from one module.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
    pub ip: String,
    pub identity: ModuleIdentity,
    pub serial_number: String,
    /// Supply voltage in volts.
    pub psu_voltage: f32,
}

impl ModuleReport {
    /// The module reports its supply in tenths of a volt.
    pub fn volts(raw: u8) -> f32 {
        f32::from(raw) / 10.0
    }

    /// One-line summary used in bulk tables.
    pub fn summary(&self) -> String {
        format!(
            "{} hw {} fw {}, {:.1} V, {}",
            self.identity.name,
            self.identity.hardware_version,
            self.identity.firmware_version,
            self.psu_voltage,
            self.serial_number
        )
    }
}

/// Digital output or input states of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStates {
    pub ip: String,
    pub direction: &'static str,
    /// State bytes as returned by the module.
    pub raw: Vec<u8>,
    /// Per-channel view, channel 1 first.
    pub channels: Vec<bool>,
}

impl ChannelStates {
    /// Expand state bytes into channels, least significant bit of the first
    /// byte being channel 1.
    pub fn from_bytes(ip: &str, direction: &'static str, raw: Vec<u8>) -> Self {
        let channels = raw
            .iter()
            .flat_map(|byte| (0..8).map(move |bit| byte & (1 << bit) != 0))
            .collect();
        Self {
            ip: ip.to_string(),
            direction,
            raw,
            channels,
        }
    }
}
