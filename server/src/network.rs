//! UDP transport: receives datagrams for the relay and sends what it fans out

use crate::config::RelayConfig;
use crate::directory::Peer;
use crate::relay::{Relay, Transport, TransportError};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A packet on its way to the socket
#[derive(Debug)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub packet: Packet,
}

/// Transport that hands packets to the socket sender task
///
/// Sending never blocks the relay; the packet is queued on an unbounded
/// channel and written to the socket by `Server`'s sender task.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&self, peer: &Peer, packet: &Packet) -> Result<(), TransportError> {
        self.tx
            .send(Outbound {
                addr: peer.addr(),
                packet: packet.clone(),
            })
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// The relay server bound to its UDP socket
pub struct Server {
    socket: Arc<UdpSocket>,
    relay: Arc<Relay<ChannelTransport>>,
    outbound_rx: Option<mpsc::UnboundedReceiver<Outbound>>,
}

impl Server {
    pub async fn new(config: RelayConfig) -> Result<Self, BoxError> {
        let socket = Arc::new(UdpSocket::bind(config.bind_address()).await?);
        let local_addr = socket.local_addr()?;
        info!("Relay listening on {}", local_addr);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let relay = Relay::new(config, ChannelTransport::new(outbound_tx), local_addr);

        Ok(Server {
            socket,
            relay: Arc::new(relay),
            outbound_rx: Some(outbound_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn relay(&self) -> Arc<Relay<ChannelTransport>> {
        Arc::clone(&self.relay)
    }

    /// Spawns task that writes queued packets to the socket
    fn spawn_network_sender(&mut self) {
        let Some(mut outbound_rx) = self.outbound_rx.take() else {
            return;
        };
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(Outbound { addr, packet }) = outbound_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
        });
    }

    /// Spawns task that drops peers which stopped sending
    fn spawn_timeout_checker(&self) {
        let relay = Arc::clone(&self.relay);
        let timeout = relay.config().peer_timeout;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                for callsign in relay.expire_peers(timeout) {
                    info!("Peer {} timed out", callsign);
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), TransportError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn handle_datagram(&self, data: &[u8], addr: SocketAddr) {
        match deserialize::<Packet>(data) {
            Ok(packet) => {
                let outcome = self.relay.on_packet(addr, packet);
                debug!("Relay pass for {}: {:?}", addr, outcome);
            }
            Err(e) => warn!("Failed to deserialize packet from {}: {}", addr, e),
        }
    }

    /// Receives and relays packets until the socket fails for good
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut buffer = [0u8; 2048];
        info!("Relay started successfully");

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => self.handle_datagram(&buffer[..len], addr),
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
