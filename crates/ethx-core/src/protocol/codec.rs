//! Request/response codec for the ETHx command protocol.
//!
//! A request frame is `[opcode][payload..]` and never exceeds
//! [`MAX_FRAME_LEN`] bytes. The reply is a raw byte run whose length the
//! caller already knows; this layer never interprets it.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::commands::Opcode;
use crate::error::CommandError;

/// Largest frame a module accepts, opcode included.
pub const MAX_FRAME_LEN: usize = 127;

/// Largest payload that fits beside the opcode.
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - 1;

/// Largest reply any command produces.
pub const MAX_REPLY_LEN: usize = 127;

/// A single command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    opcode: u8,
    payload: Vec<u8>,
}

impl CommandRequest {
    pub fn new(opcode: u8, payload: &[u8]) -> Result<Self, CommandError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CommandError::InvalidArgument(format!(
                "payload of {} bytes exceeds maximum of {}",
                payload.len(),
                MAX_PAYLOAD_LEN
            )));
        }

        Ok(Self {
            opcode,
            payload: payload.to_vec(),
        })
    }

    pub fn with_opcode(opcode: Opcode, payload: &[u8]) -> Result<Self, CommandError> {
        Self::new(opcode.as_byte(), payload)
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encode into a wire frame.
    pub fn encode(&self) -> Bytes {
        let mut frame = BytesMut::with_capacity(1 + self.payload.len());
        frame.put_u8(self.opcode);
        frame.put_slice(&self.payload);
        frame.freeze()
    }

    /// Decode a wire frame back into a request.
    pub fn decode(frame: &[u8]) -> Result<Self, CommandError> {
        match frame.split_first() {
            None => Err(CommandError::InvalidArgument("empty frame".to_string())),
            Some(_) if frame.len() > MAX_FRAME_LEN => Err(CommandError::InvalidArgument(format!(
                "frame of {} bytes exceeds maximum of {}",
                frame.len(),
                MAX_FRAME_LEN
            ))),
            Some((&opcode, payload)) => Self::new(opcode, payload),
        }
    }
}

/// Send `request` and read back exactly `reply_len` bytes.
///
/// Blocks until the reply arrives or the stream fails. Any read timeout is the
/// stream owner's business.
pub async fn execute<S>(
    stream: &mut S,
    request: &CommandRequest,
    reply_len: usize,
) -> Result<Vec<u8>, CommandError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    if reply_len == 0 || reply_len > MAX_REPLY_LEN {
        return Err(CommandError::InvalidArgument(format!(
            "reply length {} outside 1..={}",
            reply_len, MAX_REPLY_LEN
        )));
    }

    let frame = request.encode();
    stream.write_all(&frame).await?;
    stream.flush().await?;

    let mut reply = vec![0u8; reply_len];
    stream.read_exact(&mut reply).await?;

    Ok(reply)
}

/// Combine the first two reply bytes big-endian.
pub fn be_u16(reply: &[u8]) -> Result<u16, CommandError> {
    match reply {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(CommandError::InvalidArgument(format!(
            "expected 2 reply bytes, got {}",
            reply.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_round_trip_all_opcodes() {
        for op in Opcode::ALL {
            for len in 0..=MAX_PAYLOAD_LEN {
                let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
                let request = CommandRequest::with_opcode(op, &payload).unwrap();

                let decoded = CommandRequest::decode(&request.encode()).unwrap();
                assert_eq!(decoded.opcode(), op.as_byte());
                assert_eq!(decoded.payload(), payload.as_slice());
            }

            let err = CommandRequest::with_opcode(op, &[0; MAX_FRAME_LEN]).unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn test_encode_password_frame() {
        let request = CommandRequest::with_opcode(Opcode::SendPassword, b"secret").unwrap();
        assert_eq!(&request.encode()[..], b"\x79secret");
    }

    #[test]
    fn test_decode_longest_frame() {
        let mut frame = vec![Opcode::SendPassword.as_byte()];
        frame.extend(std::iter::repeat(b'x').take(MAX_PAYLOAD_LEN));
        let decoded = CommandRequest::decode(&frame).unwrap();
        assert_eq!(decoded.opcode(), 0x79);
        assert_eq!(decoded.payload().len(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_payload_too_long_rejected() {
        let payload = vec![0u8; MAX_FRAME_LEN];
        let err = CommandRequest::new(0x79, &payload).unwrap_err();
        assert!(err.is_invalid_argument());

        let frame = vec![0x79u8; MAX_FRAME_LEN + 1];
        assert!(CommandRequest::decode(&frame).is_err());
        assert!(CommandRequest::decode(&[]).is_err());
    }

    #[test]
    fn test_be_u16() {
        assert_eq!(be_u16(&[0x03, 0xFF]).unwrap(), 1023);
        assert_eq!(be_u16(&[0x00, 0x01]).unwrap(), 1);
        assert!(be_u16(&[0x01]).is_err());
    }

    #[tokio::test]
    async fn test_execute_writes_frame_and_reads_reply() {
        let (mut client, mut module) = duplex(256);

        let server = tokio::spawn(async move {
            let mut frame = [0u8; 2];
            module.read_exact(&mut frame).await.unwrap();
            module.write_all(&[0x02, 0x9A]).await.unwrap();
            frame
        });

        let request = CommandRequest::with_opcode(Opcode::GetAnalogueInput, &[3]).unwrap();
        let reply = execute(&mut client, &request, 2).await.unwrap();

        assert_eq!(reply, vec![0x02, 0x9A]);
        assert_eq!(server.await.unwrap(), [0x32, 3]);
    }

    #[tokio::test]
    async fn test_execute_zero_reply_len_rejected() {
        let (mut client, _module) = duplex(64);
        let request = CommandRequest::with_opcode(Opcode::Logout, &[]).unwrap();

        let err = execute(&mut client, &request, 0).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_execute_on_closed_stream_is_transport_failure() {
        let (mut client, module) = duplex(64);
        drop(module);

        let request = CommandRequest::with_opcode(Opcode::GetPsuVoltage, &[]).unwrap();
        let err = execute(&mut client, &request, 1).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_execute_short_reply_is_transport_failure() {
        let (mut client, mut module) = duplex(64);

        let server = tokio::spawn(async move {
            let mut frame = [0u8; 1];
            module.read_exact(&mut frame).await.unwrap();
            module.write_all(&[0x12]).await.unwrap();
            // Hang up before the remaining two bytes.
        });

        let request = CommandRequest::with_opcode(Opcode::GetModuleInfo, &[]).unwrap();
        let err = execute(&mut client, &request, 3).await.unwrap_err();
        server.await.unwrap();
        assert!(err.is_transport());
    }
}
