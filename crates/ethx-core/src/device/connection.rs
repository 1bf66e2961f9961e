//! TCP connection to a single ETHx module.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ModuleConfig;
use crate::error::CommandError;
use crate::protocol::codec::{be_u16, execute, CommandRequest, MAX_PAYLOAD_LEN};
use crate::protocol::commands::Opcode;
use crate::types::{MacAddress, ModuleIdentity, Status};

/// Persistent connection to one module.
///
/// Generic over the stream so the handshake and commands can run over any
/// byte pipe; [`EthModule::connect`] opens a TCP stream.
pub struct EthModule<S = TcpStream> {
    stream: S,
    read_timeout: Duration,
    identity: ModuleIdentity,
}

impl EthModule<TcpStream> {
    /// Connect to a module, send the password if configured, and read its identity.
    pub async fn connect(ip: &str, config: &ModuleConfig) -> Result<Self, CommandError> {
        let addr = format!("{}:{}", ip, config.port);

        let stream = timeout(config.connect_timeout(), TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connection timeout to {}", addr),
                )
            })??;
        stream.set_nodelay(true)?;
        debug!(%addr, "connected to module");

        Self::from_stream(stream, config.password.as_deref(), config.read_timeout()).await
    }
}

impl<S> EthModule<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Run the connection handshake over an already open stream.
    pub async fn from_stream(
        mut stream: S,
        password: Option<&str>,
        read_timeout: Duration,
    ) -> Result<Self, CommandError> {
        if let Some(password) = password {
            let status = send_password_on(&mut stream, password, read_timeout).await?;
            if !status.is_success() {
                return Err(CommandError::Rejected {
                    command: Opcode::SendPassword.name(),
                    status: status.raw(),
                });
            }
        }

        let reply = fixed_exchange(&mut stream, Opcode::GetModuleInfo, &[], read_timeout).await?;
        let identity = ModuleIdentity::from_info_reply([reply[0], reply[1], reply[2]]);
        debug!(
            module = %identity.name,
            id = identity.id,
            hardware = identity.hardware_version,
            firmware = identity.firmware_version,
            "module identified"
        );

        Ok(Self {
            stream,
            read_timeout,
            identity,
        })
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    async fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>, CommandError> {
        fixed_exchange(&mut self.stream, opcode, payload, self.read_timeout).await
    }

    /// Send a command whose reply size depends on the model.
    async fn send_sized(
        &mut self,
        opcode: Opcode,
        reply_len: usize,
    ) -> Result<Vec<u8>, CommandError> {
        let request = CommandRequest::with_opcode(opcode, &[])?;
        exchange(&mut self.stream, &request, reply_len, self.read_timeout).await
    }

    async fn send_status(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<Status, CommandError> {
        let reply = self.send(opcode, payload).await?;
        Ok(Status(reply[0]))
    }

    fn unsupported(&self, opcode: Opcode) -> CommandError {
        CommandError::Unsupported {
            command: opcode.name(),
            module: self.identity.name.clone(),
        }
    }

    /// Reject `channel` unless the module has channels of this kind and
    /// `1 <= channel <= available`.
    fn check_channel(
        &self,
        opcode: Opcode,
        channel: u8,
        available: usize,
    ) -> Result<(), CommandError> {
        if available == 0 {
            return Err(self.unsupported(opcode));
        }
        if channel == 0 || usize::from(channel) > available {
            return Err(CommandError::ChannelOutOfRange { channel, available });
        }
        Ok(())
    }

    /// Raw digital output state bytes; layout is model specific.
    pub async fn digital_output_states(&mut self) -> Result<Vec<u8>, CommandError> {
        let len = self.identity.capabilities.digital_output_bytes;
        if len == 0 {
            return Err(self.unsupported(Opcode::GetDigitalOutputs));
        }
        self.send_sized(Opcode::GetDigitalOutputs, len).await
    }

    /// Raw digital input state bytes; layout is model specific.
    pub async fn digital_input_states(&mut self) -> Result<Vec<u8>, CommandError> {
        let len = self.identity.capabilities.digital_input_bytes;
        if len == 0 {
            return Err(self.unsupported(Opcode::GetDigitalInputs));
        }
        self.send_sized(Opcode::GetDigitalInputs, len).await
    }

    /// Make a digital output active. `time` is the pulse length, 0 for latched.
    pub async fn digital_output_active(
        &mut self,
        channel: u8,
        time: u8,
    ) -> Result<Status, CommandError> {
        self.set_digital_output(Opcode::DigitalActive, channel, time).await
    }

    /// Make a digital output inactive. `time` is the pulse length, 0 for latched.
    pub async fn digital_output_inactive(
        &mut self,
        channel: u8,
        time: u8,
    ) -> Result<Status, CommandError> {
        self.set_digital_output(Opcode::DigitalInactive, channel, time).await
    }

    async fn set_digital_output(
        &mut self,
        opcode: Opcode,
        channel: u8,
        time: u8,
    ) -> Result<Status, CommandError> {
        let available = self.identity.capabilities.digital_output_channels();
        self.check_channel(opcode, channel, available)?;
        self.send_status(opcode, &[channel, time]).await
    }

    /// Read an analogue input as a big-endian 16-bit value.
    pub async fn analogue_input(&mut self, channel: u8) -> Result<u16, CommandError> {
        self.read_analogue(Opcode::GetAnalogueInput, channel).await
    }

    /// Read an analogue input at 12-bit resolution (ETH484b firmware only).
    pub async fn analogue_input_12bit(&mut self, channel: u8) -> Result<u16, CommandError> {
        self.read_analogue(Opcode::GetAnalogueInput12Bit, channel).await
    }

    async fn read_analogue(&mut self, opcode: Opcode, channel: u8) -> Result<u16, CommandError> {
        let available = self.identity.capabilities.analogue_inputs;
        self.check_channel(opcode, channel, available)?;
        let reply = self.send(opcode, &[channel]).await?;
        be_u16(&reply)
    }

    pub async fn set_analogue_output(
        &mut self,
        channel: u8,
        value: u8,
        time: u8,
    ) -> Result<Status, CommandError> {
        let available = self.identity.capabilities.analogue_outputs;
        self.check_channel(Opcode::SetAnalogueOutput, channel, available)?;
        self.send_status(Opcode::SetAnalogueOutput, &[channel, value, time]).await
    }

    /// The module's unique 6-byte serial number (its MAC address).
    pub async fn serial_number(&mut self) -> Result<MacAddress, CommandError> {
        let reply = self.send(Opcode::GetSerialNumber, &[]).await?;
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&reply);
        Ok(MacAddress(mac))
    }

    /// Power supply voltage in tenths of a volt.
    pub async fn psu_voltage(&mut self) -> Result<u8, CommandError> {
        let reply = self.send(Opcode::GetPsuVoltage, &[]).await?;
        Ok(reply[0])
    }

    pub async fn send_password(&mut self, password: &str) -> Result<Status, CommandError> {
        send_password_on(&mut self.stream, password, self.read_timeout).await
    }

    /// Seconds left before the module locks again; 0 when already locked.
    pub async fn unlock_time(&mut self) -> Result<u8, CommandError> {
        let reply = self.send(Opcode::GetUnlockTime, &[]).await?;
        Ok(reply[0])
    }

    pub async fn logout(&mut self) -> Result<Status, CommandError> {
        self.send_status(Opcode::Logout, &[]).await
    }

    /// Close the connection. Shutdown errors are ignored.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "module stream already closed");
        }
    }
}

async fn send_password_on<S>(
    stream: &mut S,
    password: &str,
    read_timeout: Duration,
) -> Result<Status, CommandError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    if password.len() > MAX_PAYLOAD_LEN {
        return Err(CommandError::InvalidArgument(format!(
            "password exceeds maximum length of {} bytes",
            MAX_PAYLOAD_LEN
        )));
    }

    let reply =
        fixed_exchange(stream, Opcode::SendPassword, password.as_bytes(), read_timeout).await?;
    Ok(Status(reply[0]))
}

/// Exchange for a command whose reply size is the same on every model.
async fn fixed_exchange<S>(
    stream: &mut S,
    opcode: Opcode,
    payload: &[u8],
    read_timeout: Duration,
) -> Result<Vec<u8>, CommandError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let reply_len = opcode.fixed_reply_len().ok_or_else(|| {
        CommandError::InvalidArgument(format!("{} has a model-specific reply size", opcode.name()))
    })?;
    let request = CommandRequest::with_opcode(opcode, payload)?;
    exchange(stream, &request, reply_len, read_timeout).await
}

/// One codec exchange bounded by the transport read timeout.
async fn exchange<S>(
    stream: &mut S,
    request: &CommandRequest,
    reply_len: usize,
    read_timeout: Duration,
) -> Result<Vec<u8>, CommandError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    timeout(read_timeout, execute(stream, request, reply_len))
        .await
        .map_err(|_| {
            CommandError::Transport(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no reply to {:#04x} within {:?}", request.opcode(), read_timeout),
            ))
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};
    use tokio::task::JoinHandle;

    const TIMEOUT: Duration = Duration::from_millis(500);

    /// Scripted module: for each step, read `expect.len()` bytes, check them,
    /// then write `reply`.
    fn spawn_module(
        mut module: DuplexStream,
        script: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> JoinHandle<DuplexStream> {
        tokio::spawn(async move {
            for (expect, reply) in script {
                let mut frame = vec![0u8; expect.len()];
                module.read_exact(&mut frame).await.unwrap();
                assert_eq!(frame, expect);
                module.write_all(&reply).await.unwrap();
            }
            module
        })
    }

    async fn connected(
        id: u8,
        extra: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> (EthModule<DuplexStream>, JoinHandle<DuplexStream>) {
        let (client, module) = duplex(256);
        let mut script = vec![(vec![0x10], vec![id, 2, 5])];
        script.extend(extra);
        let handle = spawn_module(module, script);
        let eth = EthModule::from_stream(client, None, TIMEOUT).await.unwrap();
        (eth, handle)
    }

    #[tokio::test]
    async fn test_handshake_reads_identity() {
        let (eth, handle) = connected(21, vec![]).await;
        handle.await.unwrap();

        let identity = eth.identity();
        assert_eq!(identity.id, 21);
        assert_eq!(identity.name, "ETH8020");
        assert_eq!(identity.hardware_version, 2);
        assert_eq!(identity.firmware_version, 5);
    }

    #[tokio::test]
    async fn test_handshake_sends_password_first() {
        let (client, module) = duplex(256);
        let handle = spawn_module(
            module,
            vec![
                (b"\x79secret".to_vec(), vec![1]),
                (vec![0x10], vec![18, 1, 4]),
            ],
        );

        let eth = EthModule::from_stream(client, Some("secret"), TIMEOUT).await.unwrap();
        handle.await.unwrap();
        assert_eq!(eth.identity().name, "ETH002");
    }

    #[tokio::test]
    async fn test_rejected_password() {
        let (client, module) = duplex(256);
        let handle = spawn_module(module, vec![(b"\x79bad".to_vec(), vec![2])]);

        let err = EthModule::from_stream(client, Some("bad"), TIMEOUT)
            .await
            .err()
            .unwrap();
        handle.await.unwrap();
        assert!(matches!(err, CommandError::Rejected { status: 2, .. }));
    }

    #[tokio::test]
    async fn test_digital_states_use_capability_lengths() {
        let (mut eth, handle) = connected(
            21,
            vec![
                (vec![0x24], vec![0x01, 0x00, 0x80]),
                (vec![0x25], vec![0xFF, 0x00, 0x0F, 0x01]),
            ],
        )
        .await;

        assert_eq!(eth.digital_output_states().await.unwrap(), vec![0x01, 0x00, 0x80]);
        assert_eq!(eth.digital_input_states().await.unwrap(), vec![0xFF, 0x00, 0x0F, 0x01]);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_commands_send_nothing() {
        // ETH002 has relays only.
        let (mut eth, handle) = connected(18, vec![]).await;
        let mut module = handle.await.unwrap();

        assert!(matches!(
            eth.digital_input_states().await,
            Err(CommandError::Unsupported { .. })
        ));
        assert!(matches!(
            eth.analogue_input(1).await,
            Err(CommandError::Unsupported { .. })
        ));
        assert!(matches!(
            eth.set_analogue_output(1, 10, 0).await,
            Err(CommandError::Unsupported { .. })
        ));

        drop(eth);
        let mut rest = Vec::new();
        module.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_analogue_channel_bounds() {
        // ETH484 has 4 analogue inputs.
        let (mut eth, handle) = connected(
            20,
            vec![
                (vec![0x32, 1], vec![0x00, 0x10]),
                (vec![0x32, 4], vec![0x03, 0xFF]),
            ],
        )
        .await;

        assert_eq!(eth.analogue_input(1).await.unwrap(), 0x0010);
        assert_eq!(eth.analogue_input(4).await.unwrap(), 1023);

        for channel in [0u8, 5, 200] {
            let err = eth.analogue_input(channel).await.unwrap_err();
            assert!(matches!(err, CommandError::ChannelOutOfRange { available: 4, .. }));
            assert!(err.is_invalid_argument());
        }

        let mut module = handle.await.unwrap();
        drop(eth);
        let mut rest = Vec::new();
        module.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_digital_output_and_status() {
        let (mut eth, handle) = connected(
            19,
            vec![
                (vec![0x20, 3, 0], vec![1]),
                (vec![0x21, 3, 50], vec![0]),
            ],
        )
        .await;

        assert_eq!(eth.digital_output_active(3, 0).await.unwrap(), Status::SUCCESS);
        assert_eq!(eth.digital_output_inactive(3, 50).await.unwrap(), Status::FAILURE);
        assert!(eth.digital_output_active(9, 0).await.unwrap_err().is_invalid_argument());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_fixed_length_queries() {
        let (mut eth, handle) = connected(
            29,
            vec![
                (vec![0x77], vec![0x00, 0x04, 0xA3, 0x11, 0x22, 0x33]),
                (vec![0x78], vec![120]),
                (vec![0x7A], vec![30]),
                (vec![0x30, 2, 128, 0], vec![1]),
                (vec![0x7B], vec![1]),
            ],
        )
        .await;

        assert_eq!(eth.serial_number().await.unwrap().to_string(), "00:04:a3:11:22:33");
        assert_eq!(eth.psu_voltage().await.unwrap(), 120);
        assert_eq!(eth.unlock_time().await.unwrap(), 30);
        assert!(eth.set_analogue_output(2, 128, 0).await.unwrap().is_success());
        assert!(eth.logout().await.unwrap().is_success());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reply_sizes_come_from_opcode_table() {
        for op in Opcode::ALL {
            let (mut client, module) = duplex(256);
            match op.fixed_reply_len() {
                Some(len) => {
                    let handle = spawn_module(module, vec![(vec![op.as_byte()], vec![7; len])]);
                    let reply = fixed_exchange(&mut client, op, &[], TIMEOUT).await.unwrap();
                    handle.await.unwrap();
                    assert_eq!(reply.len(), len, "{}", op.name());
                }
                None => {
                    let err = fixed_exchange(&mut client, op, &[], TIMEOUT)
                        .await
                        .unwrap_err();
                    assert!(err.is_invalid_argument(), "{}", op.name());
                    drop(client);
                    let mut rest = Vec::new();
                    let mut module = module;
                    module.read_to_end(&mut rest).await.unwrap();
                    assert!(rest.is_empty(), "{} sent bytes", op.name());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_broken_stream_is_transport_failure() {
        let (mut eth, handle) = connected(19, vec![]).await;
        drop(handle.await.unwrap());

        let err = eth.psu_voltage().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_silent_module_times_out() {
        let (client, _module) = duplex(256);
        let err = EthModule::from_stream(client, None, Duration::from_millis(50))
            .await
            .err()
            .unwrap();
        match err {
            CommandError::Transport(e) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_password_too_long() {
        let (mut eth, handle) = connected(19, vec![]).await;
        let _module = handle.await.unwrap();

        let long = "x".repeat(127);
        assert!(eth.send_password(&long).await.unwrap_err().is_invalid_argument());
    }
}
