//! Performance benchmarks for the relay hot paths

use bincode::{deserialize, serialize};
use client::flight::Flight;
use server::config::RelayConfig;
use server::directory::Peer;
use server::kinematics::KinematicState;
use server::relay::{Relay, Transport, TransportError};
use shared::{Cartesian, Geodetic, Packet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Transport that only counts what it is asked to send
#[derive(Default)]
struct CountingTransport {
    sent: AtomicUsize,
}

impl Transport for CountingTransport {
    fn send(&self, _peer: &Peer, _packet: &Packet) -> Result<(), TransportError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn peer_addr(index: usize) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 10_000 + index as u16))
}

fn circling_flight(index: usize) -> Flight {
    let center = Geodetic::from_degrees(8.0 + index as f64 * 0.01, 47.0, 1000.0);
    Flight::new(center, 3000.0, 70.0, index as f64)
}

/// Benchmarks relay passes with a crowded sky
#[test]
fn benchmark_relay_fan_out() {
    let peers = 50;
    let rounds = 100;
    let relay = Relay::new(
        RelayConfig::default(),
        CountingTransport::default(),
        peer_addr(0),
    );
    let flights: Vec<Flight> = (0..peers).map(circling_flight).collect();

    let start = Instant::now();

    for round in 0..rounds {
        for (index, flight) in flights.iter().enumerate() {
            let packet = Packet::position(format!("PEER{:03}", index), flight.report_at(round as f64));
            relay.on_packet_at(peer_addr(index), packet, round as u64 * 1000);
        }
    }

    let duration = start.elapsed();
    let passes = peers * rounds;
    println!(
        "Relay fan-out: {} passes over {} peers in {:?} ({:.2} μs/pass)",
        passes,
        peers,
        duration,
        duration.as_micros() as f64 / passes as f64
    );

    // once everyone is online each pass reaches every other peer
    let sent = relay.transport().sent.load(Ordering::Relaxed);
    assert!(sent >= (rounds - 1) * peers * (peers - 1));
    assert!(duration.as_secs() < 5);
}

/// Benchmarks kinematic updates
#[test]
fn benchmark_kinematic_updates() {
    let flight = circling_flight(0);
    let reports: Vec<_> = (0..1_000).map(|t| flight.report_at(t as f64)).collect();

    let iterations = 100;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut state = KinematicState::new();
        for (t, report) in reports.iter().enumerate() {
            state.update(t as u64 * 1000, report);
        }
        assert!((state.calculated_ground_speed() - 70.0).abs() < 1.0);
    }

    let duration = start.elapsed();
    let updates = iterations * reports.len();
    println!(
        "Kinematic updates: {} in {:?} ({:.2} ns/update)",
        updates,
        duration,
        duration.as_nanos() as f64 / updates as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks geodetic conversion in both directions
#[test]
fn benchmark_geodetic_conversion() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let location = Geodetic::from_degrees((i % 360) as f64 - 180.0, (i % 170) as f64 - 85.0, 500.0);
        let back = Geodetic::from(&location.to_cartesian());
        assert!((back.height - 500.0).abs() < 0.01);
    }

    let duration = start.elapsed();
    println!(
        "Geodetic conversion: {} roundtrips in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks packet serialization performance
#[test]
fn benchmark_packet_serialization() {
    let flight = circling_flight(0);
    let packet = Packet::position("HB-BEN", flight.report_at(12.0));

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let data = serialize(&packet).unwrap();
        let decoded: Packet = deserialize(&data).unwrap();
        assert_eq!(decoded.callsign.len(), 6);
    }

    let duration = start.elapsed();
    println!(
        "Packet serialization: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Stress tests distance checks at the range boundary
#[test]
fn stress_test_distance_checks() {
    let origin = Cartesian::new(4_300_000.0, 650_000.0, 4_680_000.0);
    let iterations = 1_000_000;
    let mut within = 0;

    let start = Instant::now();
    for i in 0..iterations {
        let other = Cartesian::new(origin.x + (i % 400_000) as f64, origin.y, origin.z);
        if origin.distance(&other) <= shared::DEFAULT_MAX_DISTANCE {
            within += 1;
        }
    }
    let duration = start.elapsed();

    println!(
        "Distance checks: {} in {:?}, {} within range",
        iterations, duration, within
    );

    assert!(within > 0 && within < iterations);
    assert!(duration.as_secs() < 5);
}
