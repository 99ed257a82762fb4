//! # Multiplayer Relay Server Library
//!
//! This library implements a position relay for flight simulator clients. Each
//! client periodically sends its position over UDP; the relay forwards every
//! packet to the other directly connected clients that are close enough to
//! care, and keeps a kinematic picture of each client for display purposes.
//!
//! ## Core Responsibilities
//!
//! ### Admission Policy
//! A packet reaches a destination only if the destination is a local peer, is
//! not the sender, and lies within the configured range of the sender
//! (100 nautical miles by default). Observers, recognised by their callsign
//! prefix, may chat but nothing else they send is relayed.
//!
//! ### Peer Lifecycle
//! Peers are created implicitly by their first packet. A new peer receives a
//! welcome message and every other local peer learns about it through a
//! queued server chat. Peers that stop sending are dropped by the network
//! layer's timeout checker.
//!
//! ### Server Broadcasts
//! The relay has no tick. Server-originated chat is queued and delivered to
//! every local peer exactly once, piggybacked on the next relay pass.
//!
//! ### Kinematics
//! Each peer carries ground speed, true course, heading and reception interval
//! statistics derived from its report stream, with defined fallbacks for slow,
//! paused or malformed input.
//!
//! ## Module Organization
//!
//! - `relay`: the relay pass, broadcast handling and the `Transport` seam
//! - `directory`: peers and the callsign-keyed peer directory
//! - `broadcast`: the queue of pending server broadcasts
//! - `kinematics`: per-peer kinematic state
//! - `network`: UDP socket handling, outbound sender task, peer timeouts
//! - `config`: relay settings
//!
//! ## Concurrency
//!
//! The peer directory and the broadcast queue share a single mutex inside the
//! relay, which makes each relay pass atomic and leaves no lock ordering to get
//! wrong. Deliveries are collected under that lock and sent after it is
//! released. Kinematic state sits behind a per-peer read-write lock so it can
//! be read while other peers are being relayed.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::RelayConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new(RelayConfig::default()).await?;
//!
//!     // queued for everyone, delivered with the next relayed packet
//!     server.relay().broadcast_server_chat("relay restarted");
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod directory;
pub mod kinematics;
pub mod network;
pub mod relay;
pub mod utils;
