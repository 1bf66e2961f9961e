//! Shared value types for ETHx modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::capabilities::Capabilities;

/// Known ETHx device-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Eth002,
    Eth008,
    Eth484,
    Eth8020,
    Eth0621,
    Eth044,
    Eth1620,
    Eth1610,
    Eth24v008,
    EthUploader,
    Unknown(u8),
}

impl ModuleKind {
    pub fn from_id(id: u8) -> Self {
        match id {
            18 => ModuleKind::Eth002,
            19 => ModuleKind::Eth008,
            20 => ModuleKind::Eth484,
            21 => ModuleKind::Eth8020,
            23 => ModuleKind::Eth0621,
            29 => ModuleKind::Eth044,
            51 => ModuleKind::Eth1620,
            52 => ModuleKind::Eth1610,
            54 => ModuleKind::Eth24v008,
            200 => ModuleKind::EthUploader,
            other => ModuleKind::Unknown(other),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            ModuleKind::Eth002 => 18,
            ModuleKind::Eth008 => 19,
            ModuleKind::Eth484 => 20,
            ModuleKind::Eth8020 => 21,
            ModuleKind::Eth0621 => 23,
            ModuleKind::Eth044 => 29,
            ModuleKind::Eth1620 => 51,
            ModuleKind::Eth1610 => 52,
            ModuleKind::Eth24v008 => 54,
            ModuleKind::EthUploader => 200,
            ModuleKind::Unknown(id) => *id,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleKind::Eth002 => "ETH002",
            ModuleKind::Eth008 => "ETH008",
            ModuleKind::Eth484 => "ETH484",
            ModuleKind::Eth8020 => "ETH8020",
            ModuleKind::Eth0621 => "ETH0621",
            ModuleKind::Eth044 => "ETH044",
            ModuleKind::Eth1620 => "ETH1620",
            ModuleKind::Eth1610 => "ETH1610",
            ModuleKind::Eth24v008 => "ETH24V008",
            ModuleKind::EthUploader => "ETH-UPLOADER",
            ModuleKind::Unknown(_) => "none",
        }
    }
}

/// Six-byte hardware address, displayed as lowercase colon-hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

/// Single-byte command status.
///
/// `1` is success and `0` failure. Other values are passed through untouched
/// (a rejected password answers `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status(pub u8);

impl Status {
    pub const SUCCESS: Status = Status(1);
    pub const FAILURE: Status = Status(0);

    pub fn is_success(&self) -> bool {
        *self == Status::SUCCESS
    }

    pub fn raw(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => write!(f, "success"),
            0 => write!(f, "failure"),
            other => write!(f, "status {}", other),
        }
    }
}

/// A module reported by the discovery engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub ip_address: String,
    pub host_name: String,
    pub device_id: u8,
    pub mac_address: String,
}

impl ScanResult {
    pub fn kind(&self) -> ModuleKind {
        ModuleKind::from_id(self.device_id)
    }
}

/// Identity of a connected module, read once by the module-info query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleIdentity {
    pub id: u8,
    pub hardware_version: u8,
    pub firmware_version: u8,
    pub name: String,
    pub capabilities: Capabilities,
}

impl ModuleIdentity {
    /// Build from the 3-byte module-info reply: type, hardware, firmware.
    pub fn from_info_reply(reply: [u8; 3]) -> Self {
        let [id, hardware_version, firmware_version] = reply;
        let capabilities = Capabilities::for_id(id);
        Self {
            id,
            hardware_version,
            firmware_version,
            name: capabilities.name.to_string(),
            capabilities,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        ModuleKind::from_id(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_display() {
        let mac = MacAddress([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "de:ad:be:ef:00:01");
    }

    #[test]
    fn test_module_kind_ids() {
        for id in [18u8, 19, 20, 21, 23, 29, 51, 52, 54, 200] {
            assert_eq!(ModuleKind::from_id(id).id(), id);
            assert!(!matches!(ModuleKind::from_id(id), ModuleKind::Unknown(_)));
        }
        assert_eq!(ModuleKind::from_id(7), ModuleKind::Unknown(7));
        assert_eq!(ModuleKind::from_id(7).display_name(), "none");
    }

    #[test]
    fn test_status() {
        assert!(Status(1).is_success());
        assert!(!Status(0).is_success());
        assert!(!Status(2).is_success());
        assert_eq!(Status(2).to_string(), "status 2");
    }

    #[test]
    fn test_identity_from_info_reply() {
        let identity = ModuleIdentity::from_info_reply([20, 3, 7]);
        assert_eq!(identity.name, "ETH484");
        assert_eq!(identity.hardware_version, 3);
        assert_eq!(identity.firmware_version, 7);
        assert_eq!(identity.capabilities.analogue_inputs, 4);
        assert_eq!(identity.kind(), ModuleKind::Eth484);
    }

    #[test]
    fn test_scan_result_serialization() {
        let result = ScanResult {
            ip_address: "192.168.0.10".to_string(),
            host_name: "MYDEVICE".to_string(),
            device_id: 18,
            mac_address: "de:ad:be:ef:00:01".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"ipAddress\":\"192.168.0.10\""));
        assert!(json.contains("\"deviceId\":18"));
    }
}
