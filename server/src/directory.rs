//! Connected peers and the directory that tracks them
//!
//! A peer is identified by its callsign. The directory holds at most one peer
//! per callsign and hands out `Arc<Peer>` handles so a relay pass, the timeout
//! checker and any outside observer can read a peer without holding the
//! directory itself.

use crate::kinematics::KinematicState;
use log::{info, warn};
use shared::{Cartesian, PositionReport};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Locks a mutex, recovering the data if a previous holder panicked
///
/// Everything guarded in this crate stays structurally valid between
/// statements, so a poisoned lock carries no torn state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A remote simulator client
#[derive(Debug)]
pub struct Peer {
    callsign: String,
    addr: SocketAddr,
    /// Directly connected to this relay, as opposed to known only through another relay
    local: bool,
    kinematics: RwLock<KinematicState>,
    last_seen: Mutex<Instant>,
}

impl Peer {
    /// Creates a peer connected directly to this relay
    pub fn new(callsign: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            callsign: callsign.into(),
            addr,
            local: true,
            kinematics: RwLock::new(KinematicState::new()),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Creates a display-only peer that is never a forwarding destination
    pub fn remote(callsign: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            local: false,
            ..Self::new(callsign, addr)
        }
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Observers only watch; the prefix match is case-sensitive
    pub fn is_observer(&self, prefix: &str) -> bool {
        self.callsign.starts_with(prefix)
    }

    /// Snapshot of the kinematic state
    pub fn kinematics(&self) -> KinematicState {
        self.kinematics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cartesian_position(&self) -> Cartesian {
        self.kinematics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cartesian_position()
    }

    /// Applies a position report and returns the new cartesian position
    pub fn update_position(&self, received_at_ms: u64, report: &PositionReport) -> Cartesian {
        let mut kinematics = self
            .kinematics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        kinematics.update(received_at_ms, report);
        kinematics.cartesian_position()
    }

    /// Marks the peer as active now
    pub fn touch(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    /// Checks if the peer has been silent for longer than `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        lock(&self.last_seen).elapsed() > timeout
    }
}

/// All known peers, ordered by callsign
///
/// The directory itself is not synchronized; the relay owns it together with
/// the broadcast queue behind a single lock so a relay pass never observes a
/// half-applied join or removal.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: BTreeMap<String, Arc<Peer>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a peer, replacing any peer with the same callsign
    ///
    /// Returns the replaced peer.
    pub fn add(&mut self, peer: Arc<Peer>) -> Option<Arc<Peer>> {
        self.peers.insert(peer.callsign().to_string(), peer)
    }

    pub fn remove(&mut self, callsign: &str) -> Option<Arc<Peer>> {
        let removed = self.peers.remove(callsign);
        if removed.is_some() {
            info!("Peer {} removed", callsign);
        }
        removed
    }

    pub fn get(&self, callsign: &str) -> Option<Arc<Peer>> {
        self.peers.get(callsign).cloned()
    }

    /// Snapshot of all peers in callsign order
    pub fn all(&self) -> Vec<Arc<Peer>> {
        self.peers.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.peers.values()
    }

    /// Looks up the peer sending from `addr` as `callsign`, creating it on first contact
    ///
    /// The flag is true when a new peer was created. A known callsign showing up
    /// from a different address is a new logon: the old entry is replaced.
    pub fn get_or_create(&mut self, callsign: &str, addr: SocketAddr) -> (Arc<Peer>, bool) {
        if let Some(existing) = self.peers.get(callsign) {
            if existing.addr() == addr {
                return (Arc::clone(existing), false);
            }
            warn!(
                "Peer {} moved from {} to {}, treating as new logon",
                callsign,
                existing.addr(),
                addr
            );
        }

        let peer = Arc::new(Peer::new(callsign, addr));
        info!("Peer {} connected from {}", callsign, addr);
        self.add(Arc::clone(&peer));
        (peer, true)
    }

    /// Removes every peer, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let count = self.peers.len();
        self.peers.clear();
        count
    }

    /// Removes peers silent for longer than `timeout` and returns their callsigns
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<String> {
        let timed_out: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.is_timed_out(timeout))
            .map(|(callsign, _)| callsign.clone())
            .collect();

        for callsign in &timed_out {
            self.remove(callsign);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
