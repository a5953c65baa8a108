//! Rule-based protocol selection.
//!
//! Deterministic first-match rules over latency sensitivity, node count, and
//! offered load. Not an optimizer; the reason string of the matching rule is
//! returned verbatim alongside the choice.

use crate::config::MacProtocol;
use crate::scheduler::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencySensitivity {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferedLoad {
    Low,
    Medium,
    High,
}

/// Map a packet interval to an offered-load class. Shorter intervals mean
/// more offered traffic.
pub fn classify_load(packet_interval: SimTime) -> OfferedLoad {
    if packet_interval >= 0.1 {
        OfferedLoad::Low
    } else if packet_interval >= 0.05 {
        OfferedLoad::Medium
    } else {
        OfferedLoad::High
    }
}

/// First matching rule wins.
pub fn select_protocol(
    sensitivity: LatencySensitivity,
    node_count: usize,
    load: OfferedLoad,
) -> (MacProtocol, &'static str) {
    if sensitivity == LatencySensitivity::High {
        return (MacProtocol::Slotted, "latency critical: bounded delay");
    }
    if load == OfferedLoad::High {
        return (MacProtocol::Slotted, "high load: avoid contention");
    }
    if node_count >= 9 {
        return (
            MacProtocol::Slotted,
            "many nodes: contention-based access degrades",
        );
    }
    if node_count <= 4 && load == OfferedLoad::Low {
        return (
            MacProtocol::CarrierSense,
            "low contention, relaxed latency",
        );
    }
    if node_count <= 8 && (load == OfferedLoad::Low || load == OfferedLoad::Medium) {
        return (
            MacProtocol::Reservation,
            "moderate contention, hidden nodes",
        );
    }
    (MacProtocol::Slotted, "default to deterministic access")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_classification_boundaries() {
        assert_eq!(classify_load(0.1), OfferedLoad::Low);
        assert_eq!(classify_load(0.05), OfferedLoad::Medium);
        assert_eq!(classify_load(0.049), OfferedLoad::High);
        assert_eq!(classify_load(1.0), OfferedLoad::Low);
    }

    #[test]
    fn test_latency_sensitivity_dominates() {
        let (mac, _) = select_protocol(LatencySensitivity::High, 2, OfferedLoad::Low);
        assert_eq!(mac, MacProtocol::Slotted);
    }

    #[test]
    fn test_high_load_forces_slotted() {
        let (mac, reason) = select_protocol(LatencySensitivity::Low, 2, OfferedLoad::High);
        assert_eq!(mac, MacProtocol::Slotted);
        assert_eq!(reason, "high load: avoid contention");
    }

    #[test]
    fn test_many_nodes_forces_slotted() {
        let (mac, _) = select_protocol(LatencySensitivity::Low, 9, OfferedLoad::Low);
        assert_eq!(mac, MacProtocol::Slotted);
    }

    #[test]
    fn test_small_quiet_network_uses_carrier_sense() {
        let (mac, _) = select_protocol(LatencySensitivity::Low, 4, OfferedLoad::Low);
        assert_eq!(mac, MacProtocol::CarrierSense);
    }

    #[test]
    fn test_moderate_network_uses_reservation() {
        let (mac, _) = select_protocol(LatencySensitivity::Low, 6, OfferedLoad::Low);
        assert_eq!(mac, MacProtocol::Reservation);
        let (mac, _) = select_protocol(LatencySensitivity::Low, 8, OfferedLoad::Medium);
        assert_eq!(mac, MacProtocol::Reservation);
    }

    #[test]
    fn test_reason_strings_are_exact() {
        let (_, reason) = select_protocol(LatencySensitivity::High, 100, OfferedLoad::High);
        assert_eq!(reason, "latency critical: bounded delay");
        let (_, reason) = select_protocol(LatencySensitivity::Low, 9, OfferedLoad::Medium);
        assert_eq!(reason, "many nodes: contention-based access degrades");
    }
}
