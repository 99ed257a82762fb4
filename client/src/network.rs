use crate::flight::Flight;
use bincode::{deserialize, serialize};
use log::{debug, error, info};
use shared::{Geodetic, Message, Packet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::interval;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    callsign: String,
    flight: Flight,
    report_interval: Duration,
    chat: Option<String>,
    started: Instant,
    received: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        callsign: impl Into<String>,
        flight: Flight,
        rate_hz: f64,
        chat: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;
        let rate_hz = if rate_hz > 0.0 { rate_hz } else { 1.0 };

        Ok(Client {
            socket,
            server_addr,
            callsign: callsign.into(),
            flight,
            report_interval: Duration::from_secs_f64(1.0 / rate_hz),
            chat,
            started: Instant::now(),
            received: 0,
        })
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn send_position(&self) -> Result<(), Box<dyn std::error::Error>> {
        let t = self.started.elapsed().as_secs_f64();
        let report = self.flight.report_at(t);
        self.send_packet(&Packet::position(self.callsign.as_str(), report))
            .await
    }

    fn handle_packet(&mut self, packet: Packet) {
        self.received += 1;

        match packet.message {
            Message::Chat(chat) => info!("{}: {}", packet.callsign, chat.text),
            Message::Position(report) => {
                let location = Geodetic::from(&report.position);
                debug!(
                    "{} at {:.4} {:.4} {:.0}m",
                    packet.callsign,
                    location.latitude_deg(),
                    location.longitude_deg(),
                    location.height
                );
            }
            Message::Other(payload) => {
                debug!("{} sent {} opaque bytes", packet.callsign, payload.len())
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Flying as {} via {}", self.callsign, self.server_addr);

        let mut report_interval = interval(self.report_interval);
        let mut buffer = [0u8; 2048];

        // the relay needs a position before chat can be range checked
        self.send_position().await?;
        if let Some(text) = self.chat.take() {
            self.send_packet(&Packet::chat(self.callsign.as_str(), text))
                .await?;
        }

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => match deserialize::<Packet>(&buffer[..len]) {
                            Ok(packet) => self.handle_packet(packet),
                            Err(e) => error!("Undecodable packet from relay: {}", e),
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = report_interval.tick() => {
                    if let Err(e) = self.send_position().await {
                        error!("Error sending position: {}", e);
                    }
                },
            }
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }
}
