//! # Traffic Client Library
//!
//! A headless client for the multiplayer relay. It flies a synthetic aircraft
//! around a fixed circle, reports its position to the relay at a configurable
//! rate and logs the chat and traffic it receives back. Useful for exercising
//! a relay without running a simulator.
//!
//! ## Module Organization
//!
//! - `flight`: the synthetic track and the position reports derived from it
//! - `network`: the UDP client loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::flight::Flight;
//! use client::network::Client;
//! use shared::Geodetic;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flight = Flight::random(Geodetic::from_degrees(8.54, 47.45, 900.0), 5000.0, 60.0);
//!     let mut client = Client::new("127.0.0.1:5000", "HB-TST", flight, 1.0, None).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod flight;
pub mod network;
