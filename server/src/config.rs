//! Relay configuration

use shared::{DEFAULT_MAX_DISTANCE, DEFAULT_PORT, OBSERVER_PREFIX, SERVER_CALLSIGN};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind the UDP socket to
    pub host: String,
    /// UDP port, 0 picks a free one
    pub port: u16,
    /// Packets are only forwarded to peers within this distance of the sender (metres)
    pub max_distance: f64,
    /// Callsigns starting with this prefix are observers
    pub observer_prefix: String,
    /// Callsign attributed to server-originated chat
    pub server_callsign: String,
    /// Peers silent for longer than this are dropped
    pub peer_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_distance: DEFAULT_MAX_DISTANCE,
            observer_prefix: OBSERVER_PREFIX.to_string(),
            server_callsign: SERVER_CALLSIGN.to_string(),
            peer_timeout: Duration::from_secs(10),
        }
    }
}

impl RelayConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();

        assert_eq!(config.port, 5000);
        assert_approx_eq!(config.max_distance, 185200.0, 1e-9);
        assert_eq!(config.observer_prefix, "obs");
        assert_eq!(config.server_callsign, "*server*");
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }
}
