//! Relay core: admission policy, fan-out and the peer join lifecycle
//!
//! Every inbound packet triggers one relay pass. The pass updates the sender's
//! kinematic state, decides which local peers receive the packet and flushes
//! the broadcast queue to them. The peer directory and the broadcast queue live
//! behind one lock, so a pass is atomic with respect to joins, removals and
//! queued broadcasts. Sending happens after the lock is released.

use crate::broadcast::{Broadcast, BroadcastQueue};
use crate::config::RelayConfig;
use crate::directory::{lock, Peer, PeerDirectory};
use crate::utils::get_timestamp;
use log::{debug, error, info};
use shared::{Cartesian, Message, Packet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("outbound channel closed")]
    ChannelClosed,
    #[error("failed to encode packet: {0}")]
    Encode(#[from] bincode::Error),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers packets to peers
///
/// `send` is called without any relay lock held but should still return
/// quickly; implementations that talk to a socket queue the packet and send
/// it from elsewhere.
pub trait Transport: Send + Sync {
    fn send(&self, peer: &Peer, packet: &Packet) -> Result<(), TransportError>;
}

/// What a single relay pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    /// The sender was unknown and has just logged on
    pub joined: bool,
    /// The packet was dropped by the observer rule
    pub suppressed: bool,
    /// Packets handed to the transport successfully, queued broadcasts included
    pub delivered: usize,
}

struct RelayState {
    directory: PeerDirectory,
    queue: BroadcastQueue,
}

struct Delivery {
    peer: Arc<Peer>,
    packet: Packet,
}

pub struct Relay<T: Transport> {
    config: RelayConfig,
    transport: T,
    local_addr: SocketAddr,
    state: Mutex<RelayState>,
}

impl<T: Transport> Relay<T> {
    pub fn new(config: RelayConfig, transport: T, local_addr: SocketAddr) -> Self {
        Self {
            config,
            transport,
            local_addr,
            state: Mutex::new(RelayState {
                directory: PeerDirectory::new(),
                queue: BroadcastQueue::new(),
            }),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Processes one packet received from `origin` now
    pub fn on_packet(&self, origin: SocketAddr, packet: Packet) -> RelayOutcome {
        self.on_packet_at(origin, packet, get_timestamp())
    }

    /// Processes one packet received from `origin` at `received_at_ms` (wall clock)
    pub fn on_packet_at(&self, origin: SocketAddr, packet: Packet, received_at_ms: u64) -> RelayOutcome {
        let mut outcome = RelayOutcome::default();

        let (sender, joined) = lock(&self.state)
            .directory
            .get_or_create(&packet.callsign, origin);
        sender.touch();

        if joined {
            outcome.joined = true;
            self.on_peer_joined(&sender);
        }

        let sender_position = match &packet.message {
            Message::Position(report) => sender.update_position(received_at_ms, report),
            Message::Chat(_) | Message::Other(_) => sender.cartesian_position(),
        };

        // observers may talk but their traffic is never relayed otherwise
        if !packet.is_chat() && sender.is_observer(&self.config.observer_prefix) {
            debug!("Dropping non-chat packet from observer {}", sender.callsign());
            outcome.suppressed = true;
            return outcome;
        }

        let deliveries = self.plan_fan_out(&sender, &packet, sender_position);
        outcome.delivered = self.deliver(deliveries);
        outcome
    }

    /// Collects every delivery of one relay pass and empties the broadcast queue
    ///
    /// Only local peers are destinations. Each one first gets the queued
    /// broadcasts meant for it, then the packet itself unless it is the sender
    /// or out of range. A NaN distance counts as out of range.
    fn plan_fan_out(&self, sender: &Peer, packet: &Packet, sender_position: Cartesian) -> Vec<Delivery> {
        let mut state = lock(&self.state);
        let RelayState { directory, queue } = &mut *state;
        let queued = queue.drain();
        let mut deliveries = Vec::new();

        for peer in directory.iter().filter(|peer| peer.is_local()) {
            for entry in queued.iter().filter(|entry| entry.is_for(peer.callsign())) {
                deliveries.push(Delivery {
                    peer: Arc::clone(peer),
                    packet: entry.packet.clone(),
                });
            }

            if peer.callsign() == sender.callsign() {
                continue;
            }

            let distance = peer.cartesian_position().distance(&sender_position);
            if !(distance <= self.config.max_distance) {
                debug!(
                    "{} out of range of {} ({:.0} m)",
                    peer.callsign(),
                    sender.callsign(),
                    distance
                );
                continue;
            }

            deliveries.push(Delivery {
                peer: Arc::clone(peer),
                packet: packet.clone(),
            });
        }

        deliveries
    }

    fn deliver(&self, deliveries: Vec<Delivery>) -> usize {
        let mut delivered = 0;

        for Delivery { peer, packet } in deliveries {
            match self.transport.send(&peer, &packet) {
                Ok(()) => delivered += 1,
                Err(e) => error!("Failed to send to {}: {}", peer.callsign(), e),
            }
        }

        delivered
    }

    /// Queues a chat message from the server for every local peer
    ///
    /// Nothing is sent here; the entry rides along with the next relay pass.
    pub fn broadcast_server_chat(&self, text: impl Into<String>) {
        self.enqueue(Broadcast::new(self.server_chat(text)));
    }

    /// Welcomes a peer that has just logged on and announces it to everyone else
    pub fn on_peer_joined(&self, peer: &Peer) {
        info!("Peer {} came online", peer.callsign());

        let welcome = self.server_chat(format!(
            "Welcome to the multiplayer relay at {}",
            self.local_addr
        ));
        if let Err(e) = self.transport.send(peer, &welcome) {
            error!("Failed to welcome {}: {}", peer.callsign(), e);
        }

        let announcement = self.server_chat(format!("{} came online", peer.callsign()));
        self.enqueue(Broadcast::excluding(announcement, peer.callsign()));
    }

    fn server_chat(&self, text: impl Into<String>) -> Packet {
        Packet::chat(self.config.server_callsign.as_str(), text)
    }

    fn enqueue(&self, entry: Broadcast) {
        lock(&self.state).queue.push(entry);
    }

    pub fn pending_broadcasts(&self) -> usize {
        lock(&self.state).queue.len()
    }

    pub fn add_peer(&self, peer: Arc<Peer>) -> Option<Arc<Peer>> {
        lock(&self.state).directory.add(peer)
    }

    pub fn remove_peer(&self, callsign: &str) -> Option<Arc<Peer>> {
        lock(&self.state).directory.remove(callsign)
    }

    pub fn peer(&self, callsign: &str) -> Option<Arc<Peer>> {
        lock(&self.state).directory.get(callsign)
    }

    pub fn peers(&self) -> Vec<Arc<Peer>> {
        lock(&self.state).directory.all()
    }

    /// Forgets every peer, e.g. after the upstream connection was reset
    pub fn clear_peers(&self) -> usize {
        lock(&self.state).directory.clear()
    }

    /// Drops peers that have been silent for longer than `timeout`
    pub fn expire_peers(&self, timeout: Duration) -> Vec<String> {
        lock(&self.state).directory.check_timeouts(timeout)
    }
}
