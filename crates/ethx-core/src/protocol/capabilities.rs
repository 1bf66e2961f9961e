//! Per-model capability table.
//!
//! Maps a device-type code to its display name and channel counts. Unknown
//! codes resolve to a record with no channels, so every channel-dependent
//! command on them is refused locally.

use serde::Serialize;

use crate::types::ModuleKind;

/// Channel counts and name of one module model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub name: &'static str,
    /// Bytes returned by the get-digital-inputs command.
    pub digital_input_bytes: usize,
    /// Bytes returned by the get-digital-outputs command.
    pub digital_output_bytes: usize,
    pub analogue_inputs: usize,
    pub analogue_outputs: usize,
}

impl Capabilities {
    const NONE: Capabilities = Capabilities::new("none", 0, 0, 0, 0);

    const fn new(
        name: &'static str,
        digital_input_bytes: usize,
        digital_output_bytes: usize,
        analogue_inputs: usize,
        analogue_outputs: usize,
    ) -> Self {
        Self {
            name,
            digital_input_bytes,
            digital_output_bytes,
            analogue_inputs,
            analogue_outputs,
        }
    }

    pub fn for_id(id: u8) -> Self {
        Self::for_kind(ModuleKind::from_id(id))
    }

    pub fn for_kind(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Eth002 => Capabilities::new("ETH002", 0, 1, 0, 0),
            ModuleKind::Eth008 => Capabilities::new("ETH008", 0, 1, 0, 0),
            ModuleKind::Eth484 => Capabilities::new("ETH484", 2, 2, 4, 0),
            ModuleKind::Eth8020 => Capabilities::new("ETH8020", 4, 3, 8, 0),
            ModuleKind::Eth0621 => Capabilities::new("ETH0621", 4, 3, 1, 2),
            ModuleKind::Eth044 => Capabilities::new("ETH044", 2, 2, 0, 4),
            ModuleKind::Eth1620 => Capabilities::new("ETH1620", 0, 3, 16, 0),
            ModuleKind::Eth1610 => Capabilities::new("ETH1610", 0, 2, 16, 0),
            ModuleKind::Eth24v008 => Capabilities::new("ETH24V008", 1, 1, 0, 0),
            // The uploader is a discovery-only target with no I/O.
            ModuleKind::EthUploader | ModuleKind::Unknown(_) => Capabilities::NONE,
        }
    }

    /// Addressable digital outputs, one bit per channel in the state reply.
    pub fn digital_output_channels(&self) -> usize {
        self.digital_output_bytes * 8
    }
}
