//! UDP discovery engine.
//!
//! Broadcasts a single probe and reports every ETHx module that answers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, trace, warn};

use super::observer::{ChannelObserver, ObserverRegistry, ScanObserver};
use super::packet::{decode_packet, is_candidate};
use crate::config::ScanConfig;
use crate::error::DiscoveryError;
use crate::types::ScanResult;

/// Probe payload every module answers.
pub const PROBE: &[u8] = b"Discovery: Who is out there?\0\n";

/// Ethernet MTU less the IP and UDP headers.
const MAX_DATAGRAM_LEN: usize = 1500 - 28;

/// Lifecycle of a discovery engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Probing,
    Listening,
    Stopped,
}

impl ScanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Probing => "probing",
            ScanState::Listening => "listening",
            ScanState::Stopped => "stopped",
        }
    }
}

/// Create a UDP socket able to broadcast, with address reuse so other
/// listeners on the discovery port keep working.
pub fn create_broadcast_socket(addr: SocketAddr) -> Result<std::net::UdpSocket, std::io::Error> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;

    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    socket.set_broadcast(true)?;
    socket.bind(&addr.into())?;

    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// Discovery engine: one probe, then a background receive task.
pub struct DiscoveryEngine {
    config: ScanConfig,
    observers: ObserverRegistry,
    state: Arc<Mutex<ScanState>>,
    decode_lock: Arc<Mutex<()>>,
    local_addr: Option<SocketAddr>,
    worker: Option<JoinHandle<()>>,
}

impl DiscoveryEngine {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            observers: ObserverRegistry::new(),
            state: Arc::new(Mutex::new(ScanState::Idle)),
            decode_lock: Arc::new(Mutex::new(())),
            local_addr: None,
            worker: None,
        }
    }

    /// Register an observer. Adding the same observer twice has no effect.
    pub fn add_observer(&self, observer: Arc<dyn ScanObserver>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Arc<dyn ScanObserver>) -> bool {
        self.observers.remove(observer)
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address the discovery socket is bound to, once scanning.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn set_state(&self, state: ScanState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Send the probe and start listening for replies.
    ///
    /// Must be called from within a tokio runtime. On failure the engine is
    /// left `Stopped`.
    pub async fn scan(&mut self) -> Result<(), DiscoveryError> {
        let current = self.state();
        if current != ScanState::Idle {
            return Err(DiscoveryError::InvalidState(current.as_str()));
        }
        self.set_state(ScanState::Probing);

        let socket = match self.open_and_probe().await {
            Ok(socket) => socket,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };

        self.local_addr = socket.local_addr().ok();
        debug!(
            local = ?self.local_addr,
            target = %self.config.target_addr,
            "discovery probe sent"
        );

        self.set_state(ScanState::Listening);
        self.worker = Some(tokio::spawn(receive_loop(
            socket,
            self.observers.clone(),
            self.state.clone(),
            self.decode_lock.clone(),
            self.config.receive_timeout(),
        )));

        Ok(())
    }

    async fn open_and_probe(&self) -> Result<UdpSocket, DiscoveryError> {
        let bind_addr = self.config.bind_addr;
        let std_socket =
            create_broadcast_socket(bind_addr).map_err(|source| DiscoveryError::Bind {
                addr: bind_addr.to_string(),
                source,
            })?;
        let socket = UdpSocket::from_std(std_socket)?;

        let target = self.config.target_addr;
        socket
            .send_to(PROBE, target)
            .await
            .map_err(|source| DiscoveryError::Probe {
                addr: target.to_string(),
                source,
            })?;

        Ok(socket)
    }

    /// Stop listening and release the socket. Safe to call in any state.
    pub fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
            debug!("discovery stopped");
        }
        self.set_state(ScanState::Stopped);
    }

    /// Scan for `duration` and return the modules found, one per MAC
    /// address, sorted by IP.
    pub async fn discover_once(
        config: &ScanConfig,
        duration: Duration,
    ) -> Result<Vec<ScanResult>, DiscoveryError> {
        let (observer, mut rx) = ChannelObserver::new();
        let mut engine = DiscoveryEngine::new(config.clone());
        engine.add_observer(Arc::new(observer));
        engine.scan().await?;

        let deadline = Instant::now() + duration;
        let mut modules: HashMap<String, ScanResult> = HashMap::new();

        while let Ok(Some(module)) = timeout_at(deadline, rx.recv()).await {
            modules.insert(module.mac_address.clone(), module);
        }

        engine.close();

        let mut module_list: Vec<ScanResult> = modules.into_values().collect();
        module_list.sort_by(|a, b| a.ip_address.cmp(&b.ip_address));

        Ok(module_list)
    }
}

impl Drop for DiscoveryEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    observers: ObserverRegistry,
    state: Arc<Mutex<ScanState>>,
    decode_lock: Arc<Mutex<()>>,
    receive_timeout: Duration,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    let mut loopback_skipped = false;

    loop {
        let (len, addr) = match timeout(receive_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                warn!(error = %e, "discovery receive failed");
                break;
            }
            Err(_) => {
                // Timeout - keep listening
                continue;
            }
        };

        // The first datagram is our own probe looping back.
        if !loopback_skipped {
            loopback_skipped = true;
            trace!(%addr, len, "skipping first discovery datagram");
            continue;
        }

        let payload = &buf[..len];
        if !is_candidate(payload) {
            trace!(%addr, len, "ignoring short or blank discovery datagram");
            continue;
        }

        {
            let _guard = decode_lock.lock().unwrap_or_else(PoisonError::into_inner);
            for module in decode_packet(payload) {
                debug!(ip = %module.ip_address, id = module.device_id, "module found");
                observers.notify(&module);
            }
        }
    }

    *state.lock().unwrap_or_else(PoisonError::into_inner) = ScanState::Stopped;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    const WAIT: Duration = Duration::from_secs(2);

    fn loopback_config(target: SocketAddr) -> ScanConfig {
        ScanConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            target_addr: target,
            receive_timeout_ms: 50,
        }
    }

    /// A full-size reply for a module at 192.168.0.`last_octet`.
    fn reply(last_octet: u8, device_code: u8) -> Vec<u8> {
        let mut packet = vec![0x03];
        packet.extend_from_slice(b"Ethernet\r\n");
        packet.extend_from_slice(&[0x02, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, last_octet]);
        packet.push(0x04);
        packet.extend_from_slice(b"MYDEVICE \r\n");
        packet.extend_from_slice(&[0x05, 192, 168, 0, last_octet]);
        packet.extend_from_slice(&[0x40, device_code, 0x0D, 0x0A]);
        packet
    }

    async fn start_engine() -> (DiscoveryEngine, UdpSocket, UnboundedReceiver<ScanResult>) {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut engine = DiscoveryEngine::new(loopback_config(peer.local_addr().unwrap()));
        let (observer, rx) = ChannelObserver::new();
        engine.add_observer(Arc::new(observer));
        engine.scan().await.unwrap();
        (engine, peer, rx)
    }

    async fn send(peer: &UdpSocket, engine: &DiscoveryEngine, packet: &[u8]) {
        peer.send_to(packet, engine.local_addr().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_is_sent() {
        let (engine, peer, _rx) = start_engine().await;

        let mut buf = [0u8; 64];
        let (len, from) = timeout(WAIT, peer.recv_from(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..len], PROBE);
        assert_eq!(Some(from), engine.local_addr());
        assert_eq!(engine.state(), ScanState::Listening);
    }

    #[tokio::test]
    async fn test_first_datagram_discarded() {
        let (engine, peer, mut rx) = start_engine().await;

        send(&peer, &engine, &reply(10, 18)).await;
        send(&peer, &engine, &reply(11, 19)).await;

        let module = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(module.ip_address, "192.168.0.11");
        assert_eq!(module.device_id, 19);
        assert_eq!(module.host_name, "MYDEVICE");
        assert_eq!(module.mac_address, "de:ad:be:ef:00:0b");

        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_short_and_blank_datagrams_ignored() {
        let (engine, peer, mut rx) = start_engine().await;

        send(&peer, &engine, b"loopback").await;
        send(&peer, &engine, &[b' '; 64]).await;

        // Decodes fine on its own but is under the minimum length.
        let mut short = vec![0x02, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01, 0x05, 10, 0, 0, 1];
        short.extend_from_slice(&[0x40, 18, 0x0D, 0x0A]);
        send(&peer, &engine, &short).await;

        send(&peer, &engine, &reply(12, 20)).await;

        let module = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(module.ip_address, "192.168.0.12");
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_excluded_family_not_reported() {
        let (engine, peer, mut rx) = start_engine().await;

        send(&peer, &engine, b"loopback").await;
        send(&peer, &engine, &reply(20, 30)).await;
        send(&peer, &engine, &reply(21, 54)).await;

        let module = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(module.ip_address, "192.168.0.21");
        assert_eq!(module.device_id, 54);
    }

    #[tokio::test]
    async fn test_panicking_observer_keeps_loop_alive() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut engine = DiscoveryEngine::new(loopback_config(peer.local_addr().unwrap()));
        engine.add_observer(Arc::new(|_: ScanResult| panic!("observer failure")));
        let (observer, mut rx) = ChannelObserver::new();
        engine.add_observer(Arc::new(observer));
        engine.scan().await.unwrap();

        send(&peer, &engine, b"loopback").await;
        send(&peer, &engine, &reply(30, 18)).await;
        send(&peer, &engine, &reply(31, 18)).await;

        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.ip_address, "192.168.0.30");
        assert_eq!(second.ip_address, "192.168.0.31");
        assert_eq!(engine.state(), ScanState::Listening);
    }

    #[tokio::test]
    async fn test_state_transitions_and_idempotent_close() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut engine = DiscoveryEngine::new(loopback_config(peer.local_addr().unwrap()));
        assert_eq!(engine.state(), ScanState::Idle);
        assert!(engine.local_addr().is_none());

        // Closing before scanning is fine.
        engine.close();
        assert_eq!(engine.state(), ScanState::Stopped);
        assert!(matches!(
            engine.scan().await,
            Err(DiscoveryError::InvalidState("stopped"))
        ));

        let mut engine = DiscoveryEngine::new(loopback_config(peer.local_addr().unwrap()));
        engine.scan().await.unwrap();
        assert_eq!(engine.state(), ScanState::Listening);
        assert!(matches!(
            engine.scan().await,
            Err(DiscoveryError::InvalidState("listening"))
        ));

        engine.close();
        engine.close();
        assert_eq!(engine.state(), ScanState::Stopped);
    }

    #[tokio::test]
    async fn test_discover_once_deduplicates_by_mac() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let probe_target = peer.local_addr().unwrap();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, engine_addr) = peer.recv_from(&mut buf).await.unwrap();
            peer.send_to(b"loopback", engine_addr).await.unwrap();
            for packet in [reply(41, 21), reply(40, 18), reply(41, 21)] {
                peer.send_to(&packet, engine_addr).await.unwrap();
            }
        });

        let modules = DiscoveryEngine::discover_once(
            &loopback_config(probe_target),
            Duration::from_millis(500),
        )
        .await
        .unwrap();
        responder.await.unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].ip_address, "192.168.0.40");
        assert_eq!(modules[1].ip_address, "192.168.0.41");
    }
}
