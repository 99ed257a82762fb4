//! Server-originated packets waiting for the next relay pass
//!
//! The relay has no tick of its own. Anything the server wants to say is queued
//! here and piggybacks on the fan-out of the next packet that arrives.

use shared::Packet;

#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub packet: Packet,
    /// Callsign that must not receive this entry
    pub exclude: Option<String>,
}

impl Broadcast {
    pub fn new(packet: Packet) -> Self {
        Self {
            packet,
            exclude: None,
        }
    }

    pub fn excluding(packet: Packet, callsign: impl Into<String>) -> Self {
        Self {
            packet,
            exclude: Some(callsign.into()),
        }
    }

    pub fn is_for(&self, callsign: &str) -> bool {
        self.exclude.as_deref() != Some(callsign)
    }
}

/// FIFO of pending broadcasts, emptied as a whole by each relay pass
#[derive(Debug, Default)]
pub struct BroadcastQueue {
    entries: Vec<Broadcast>,
}

impl BroadcastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Broadcast) {
        self.entries.push(entry);
    }

    /// Takes every queued entry in enqueue order, leaving the queue empty
    pub fn drain(&mut self) -> Vec<Broadcast> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut queue = BroadcastQueue::new();
        queue.push(Broadcast::new(Packet::chat("*server*", "A")));
        queue.push(Broadcast::new(Packet::chat("*server*", "B")));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        let texts: Vec<&str> = drained.iter().filter_map(|b| b.packet.chat_text()).collect();

        assert_eq!(texts, vec!["A", "B"]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_exclusion() {
        let open = Broadcast::new(Packet::chat("*server*", "hi"));
        let closed = Broadcast::excluding(Packet::chat("*server*", "HB-ABC came online"), "HB-ABC");

        assert!(open.is_for("HB-ABC"));
        assert!(!closed.is_for("HB-ABC"));
        assert!(closed.is_for("D-EFGH"));
    }
}
