//! Command opcodes for the ETHx TCP protocol.
//!
//! Every request is a single opcode byte followed by a short payload, and every
//! request gets exactly one reply.

/// Command opcodes understood by ETHx modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    GetModuleInfo = 0x10,
    DigitalActive = 0x20,
    DigitalInactive = 0x21,
    GetDigitalOutputs = 0x24,
    GetDigitalInputs = 0x25,
    SetAnalogueOutput = 0x30,
    GetAnalogueInput = 0x32,
    GetAnalogueInput12Bit = 0x33,
    GetSerialNumber = 0x77,
    GetPsuVoltage = 0x78,
    SendPassword = 0x79,
    GetUnlockTime = 0x7A,
    Logout = 0x7B,
}

impl Opcode {
    pub const ALL: [Opcode; 13] = [
        Opcode::GetModuleInfo,
        Opcode::DigitalActive,
        Opcode::DigitalInactive,
        Opcode::GetDigitalOutputs,
        Opcode::GetDigitalInputs,
        Opcode::SetAnalogueOutput,
        Opcode::GetAnalogueInput,
        Opcode::GetAnalogueInput12Bit,
        Opcode::GetSerialNumber,
        Opcode::GetPsuVoltage,
        Opcode::SendPassword,
        Opcode::GetUnlockTime,
        Opcode::Logout,
    ];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_byte() == byte)
    }

    /// Reply length for commands whose answer size does not depend on the model.
    pub fn fixed_reply_len(self) -> Option<usize> {
        match self {
            Opcode::GetModuleInfo => Some(3),
            Opcode::GetAnalogueInput | Opcode::GetAnalogueInput12Bit => Some(2),
            Opcode::GetSerialNumber => Some(6),
            Opcode::DigitalActive
            | Opcode::DigitalInactive
            | Opcode::SetAnalogueOutput
            | Opcode::GetPsuVoltage
            | Opcode::SendPassword
            | Opcode::GetUnlockTime
            | Opcode::Logout => Some(1),
            Opcode::GetDigitalOutputs | Opcode::GetDigitalInputs => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::GetModuleInfo => "module info",
            Opcode::DigitalActive => "digital output active",
            Opcode::DigitalInactive => "digital output inactive",
            Opcode::GetDigitalOutputs => "get digital outputs",
            Opcode::GetDigitalInputs => "get digital inputs",
            Opcode::SetAnalogueOutput => "set analogue output",
            Opcode::GetAnalogueInput => "analogue input",
            Opcode::GetAnalogueInput12Bit => "12-bit analogue input",
            Opcode::GetSerialNumber => "serial number",
            Opcode::GetPsuVoltage => "power supply voltage",
            Opcode::SendPassword => "password",
            Opcode::GetUnlockTime => "unlock time",
            Opcode::Logout => "logout",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op.as_byte()
    }
}
