//! Discovery reply decoding.
//!
//! Replies are a run of tagged fields. A tag byte selects how its value is
//! delimited: a fixed byte count (MAC, IPv4) or a CR LF terminator (names and
//! the device-type record). Each field may be followed by a CR and/or LF.
//!
//! This is a standalone function to allow testing without a socket.

use std::ops::RangeInclusive;

use tracing::trace;

use crate::types::{MacAddress, ScanResult};

/// Shortest datagram that can hold a complete discovery record.
pub const MIN_PACKET_LEN: usize = 35;

/// Device-type codes reported to observers.
pub const ETHX_FAMILY: [u8; 8] = [
    18,  // ETH002
    19,  // ETH008
    20,  // ETH484
    21,  // ETH8020
    51,  // ETH1620
    52,  // ETH1610
    54,  // ETH24V008
    200, // ETH-UPLOADER
];

/// Other product lines that answer the same probe.
const EXCLUDED_FAMILIES: [RangeInclusive<u8>; 2] = [30..=31, 34..=35];

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

mod tags {
    pub const END_OF_DATA: u8 = 0x01;
    pub const MAC_ADDRESS: u8 = 0x02;
    pub const MAC_TYPE: u8 = 0x03;
    pub const HOST_NAME: u8 = 0x04;
    pub const IPV4_ADDRESS: u8 = 0x05;
    pub const IPV6_FIRST: u8 = 0x06;
    pub const IPV6_LAST: u8 = 0x09;
    pub const DEVICE_TYPE: u8 = 0x40;
    pub const TERMINATOR: u8 = 0x41;
}

/// How a device-type code is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    Ethx,
    Excluded,
    Other,
}

impl DeviceFamily {
    pub fn classify(code: u8) -> Self {
        if ETHX_FAMILY.contains(&code) {
            DeviceFamily::Ethx
        } else if EXCLUDED_FAMILIES.iter().any(|r| r.contains(&code)) {
            DeviceFamily::Excluded
        } else {
            DeviceFamily::Other
        }
    }
}

/// True if a datagram is worth decoding: long enough and not blank.
pub fn is_candidate(payload: &[u8]) -> bool {
    payload.len() >= MIN_PACKET_LEN && payload.iter().any(|&b| b > b' ')
}

/// Decode one discovery reply.
///
/// Every device-type record from the ETHx family yields a result built from
/// the MAC, host name and IPv4 fields seen before it. Any abort (end marker,
/// terminator, unknown tag, foreign device type, truncated field) stops the
/// walk; the record being assembled is dropped.
pub fn decode_packet(packet: &[u8]) -> Vec<ScanResult> {
    let mut cursor = Cursor::new(packet);
    let mut fields = Fields::default();
    let mut results = Vec::new();

    while let Some(tag) = cursor.next_byte() {
        let step = match tag {
            tags::END_OF_DATA | tags::TERMINATOR => Step::Abort("end of data"),
            tags::MAC_ADDRESS => match cursor.take(6) {
                Some(bytes) => {
                    let mut mac = [0u8; 6];
                    mac.copy_from_slice(bytes);
                    fields.mac_address = MacAddress(mac).to_string();
                    Step::Continue
                }
                None => Step::Abort("truncated MAC address"),
            },
            tags::MAC_TYPE => match cursor.take_line() {
                Some(_) => Step::Continue,
                None => Step::Abort("unterminated MAC type"),
            },
            tags::HOST_NAME => match cursor.take_line() {
                Some(bytes) => {
                    let name = bytes.split(|&b| b == b' ').next().unwrap_or_default();
                    fields.host_name = String::from_utf8_lossy(name).into_owned();
                    Step::Continue
                }
                None => Step::Abort("unterminated host name"),
            },
            tags::IPV4_ADDRESS => match cursor.take(4) {
                Some(&[a, b, c, d]) => {
                    fields.ip_address = format!("{}.{}.{}.{}", a, b, c, d);
                    Step::Continue
                }
                _ => Step::Abort("truncated IPv4 address"),
            },
            tags::IPV6_FIRST..=tags::IPV6_LAST => Step::Continue,
            tags::DEVICE_TYPE => match cursor.take_line().and_then(|f| f.first().copied()) {
                Some(code) => match DeviceFamily::classify(code) {
                    DeviceFamily::Ethx => {
                        results.push(fields.to_result(code));
                        Step::Continue
                    }
                    DeviceFamily::Excluded => Step::Abort("excluded product line"),
                    DeviceFamily::Other => Step::Abort("unknown device type"),
                },
                None => Step::Abort("unterminated device type"),
            },
            _ => Step::Abort("unknown tag"),
        };

        if let Step::Abort(reason) = step {
            trace!(tag, reason, "discovery packet walk stopped");
            break;
        }

        cursor.skip_line_end();
    }

    results
}

enum Step {
    Continue,
    Abort(&'static str),
}

#[derive(Default)]
struct Fields {
    mac_address: String,
    host_name: String,
    ip_address: String,
}

impl Fields {
    fn to_result(&self, device_id: u8) -> ScanResult {
        ScanResult {
            ip_address: self.ip_address.clone(),
            host_name: self.host_name.clone(),
            device_id,
            mac_address: self.mac_address.clone(),
        }
    }
}

/// Bounds-checked reader over a datagram.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let bytes = self.buf.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(bytes)
    }

    /// Bytes up to the next CR LF pair. The cursor stops on the CR.
    fn take_line(&mut self) -> Option<&'a [u8]> {
        let rest = self.buf.get(self.pos..)?;
        let end = rest.windows(2).position(|pair| pair == [CR, LF])?;
        let line = &rest[..end];
        self.pos += end;
        Some(line)
    }

    fn skip_line_end(&mut self) {
        if self.buf.get(self.pos) == Some(&CR) {
            self.pos += 1;
        }
        if self.buf.get(self.pos) == Some(&LF) {
            self.pos += 1;
        }
    }
}
