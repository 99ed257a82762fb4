use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub mod geo;

pub use geo::{normalize_degrees, Cartesian, Geodetic};

pub const DEFAULT_PORT: u16 = 5000;
pub const NAUTICAL_MILE: f64 = 1852.0;
/// One knot in metres per second
pub const KNOT: f64 = NAUTICAL_MILE / 3600.0;
pub const DEFAULT_MAX_DISTANCE: f64 = 100.0 * NAUTICAL_MILE;
pub const OBSERVER_PREFIX: &str = "obs";
pub const SERVER_CALLSIGN: &str = "*server*";

/// One datagram: the sender's callsign and what it sent
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Packet {
    pub callsign: String,
    pub message: Message,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Message {
    Position(PositionReport),
    Chat(ChatMessage),
    /// Payload the relay does not interpret, forwarded as-is
    Other(Vec<u8>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PositionReport {
    /// Aircraft model path as reported by the simulator
    pub model: String,
    /// Simulation time in seconds, chosen by the client
    pub time: f64,
    /// ECEF position in metres
    pub position: Cartesian,
    /// Body to ECEF rotation as an angle-axis vector (radians)
    pub orientation: Cartesian,
    /// Body frame velocity in metres per second
    pub linear_velocity: Cartesian,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub text: String,
}

impl Packet {
    pub fn new(callsign: impl Into<String>, message: Message) -> Self {
        Self {
            callsign: callsign.into(),
            message,
        }
    }

    pub fn position(callsign: impl Into<String>, report: PositionReport) -> Self {
        Self::new(callsign, Message::Position(report))
    }

    pub fn chat(callsign: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(callsign, Message::Chat(ChatMessage { text: text.into() }))
    }

    pub fn is_chat(&self) -> bool {
        matches!(self.message, Message::Chat(_))
    }

    pub fn chat_text(&self) -> Option<&str> {
        match &self.message {
            Message::Chat(chat) => Some(&chat.text),
            _ => None,
        }
    }
}

impl PositionReport {
    pub fn orientation_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_scaled_axis(self.orientation.to_vector())
    }

    /// Builds the angle-axis orientation of an aircraft flying level at `location`
    /// with the given true heading in degrees
    pub fn level_orientation(location: &Geodetic, heading_deg: f64) -> Cartesian {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), heading_deg.to_radians());
        let body_to_ecef = location.horizontal_frame() * yaw;
        Cartesian::from_vector(&body_to_ecef.scaled_axis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_report() -> PositionReport {
        let location = Geodetic::from_degrees(8.54, 47.45, 1000.0);
        PositionReport {
            model: "Aircraft/c172p/Models/c172p.xml".to_string(),
            time: 12.5,
            position: location.to_cartesian(),
            orientation: PositionReport::level_orientation(&location, 90.0),
            linear_velocity: Cartesian::new(50.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_packet_serialization_position() {
        let packet = Packet::position("HB-ABC", test_report());
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        assert_eq!(deserialized, packet);
        assert!(!deserialized.is_chat());
    }

    #[test]
    fn test_packet_serialization_chat() {
        let packet = Packet::chat("obs1", "hello tower");
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        assert!(deserialized.is_chat());
        assert_eq!(deserialized.callsign, "obs1");
        assert_eq!(deserialized.chat_text(), Some("hello tower"));
    }

    #[test]
    fn test_garbage_does_not_deserialize() {
        let result: Result<Packet, _> = bincode::deserialize(&[0xff, 0xff, 0xff]);
        assert!(result.is_err());
    }

    #[test]
    fn test_level_orientation_heading() {
        let location = Geodetic::from_degrees(-3.0, 55.9, 0.0);
        let angle_axis = PositionReport::level_orientation(&location, 135.0);
        let body_to_ecef = UnitQuaternion::from_scaled_axis(angle_axis.to_vector());
        let body_to_hf = location.horizontal_frame().inverse() * body_to_ecef;

        let (roll, pitch, yaw) = body_to_hf.euler_angles();
        assert_approx_eq!(roll, 0.0, 1e-9);
        assert_approx_eq!(pitch, 0.0, 1e-9);
        assert_approx_eq!(yaw.to_degrees(), 135.0, 1e-9);
    }

    #[test]
    fn test_default_range_in_metres() {
        assert_approx_eq!(DEFAULT_MAX_DISTANCE, 185200.0, 1e-9);
        assert_approx_eq!(10.0 * KNOT, 5.144444, 1e-5);
    }
}
