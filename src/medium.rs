//! Shared broadcast medium with collision detection.
//!
//! One occupancy counter per transmission domain. The accounting is causal:
//! a transmission that begins while the medium is already occupied is itself
//! flagged as collided; a transmission that arrived first and is later joined
//! by others keeps its clear outcome.

use serde::Deserialize;

use crate::scheduler::{NodeId, SimTime};

/// Outcome of a single transmission attempt, as sensed by the medium at the
/// moment the transmission begins.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ChannelOutcome {
    Clear,
    Collided,
}

/// Medium timing parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MediumConfig {
    /// Propagation/hold time: delay between a transmission beginning and its
    /// outcome arriving back at the sender.
    pub hold_time: SimTime,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self { hold_time: 0.001 }
    }
}

/// One broadcast transmission domain.
#[derive(Debug, Default)]
pub struct SharedMedium {
    active_tx: u32,
}

impl SharedMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transmission start and report whether it collided with an
    /// already-active one.
    pub fn begin_transmission(&mut self, _sender: NodeId) -> ChannelOutcome {
        self.active_tx += 1;
        if self.active_tx > 1 {
            ChannelOutcome::Collided
        } else {
            ChannelOutcome::Clear
        }
    }

    /// Register a transmission end. Never drops the count below zero.
    pub fn end_transmission(&mut self, _sender: NodeId) {
        self.active_tx = self.active_tx.saturating_sub(1);
    }

    /// Number of currently active transmitters.
    pub fn occupancy(&self) -> u32 {
        self.active_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_transmission_is_clear() {
        let mut m = SharedMedium::new();
        assert_eq!(m.begin_transmission(0), ChannelOutcome::Clear);
        assert_eq!(m.occupancy(), 1);
        m.end_transmission(0);
        assert_eq!(m.occupancy(), 0);
    }

    #[test]
    fn test_late_arrival_collides_first_does_not() {
        let mut m = SharedMedium::new();
        // First arrival senses a free medium and keeps its clear outcome even
        // though a second transmission joins before it ends.
        assert_eq!(m.begin_transmission(0), ChannelOutcome::Clear);
        assert_eq!(m.begin_transmission(1), ChannelOutcome::Collided);
        assert_eq!(m.occupancy(), 2);
        m.end_transmission(0);
        m.end_transmission(1);
        assert_eq!(m.occupancy(), 0);
    }

    #[test]
    fn test_occupancy_never_goes_negative() {
        let mut m = SharedMedium::new();
        m.end_transmission(0);
        assert_eq!(m.occupancy(), 0);
        assert_eq!(m.begin_transmission(0), ChannelOutcome::Clear);
    }

    #[test]
    fn test_medium_frees_after_overlap() {
        let mut m = SharedMedium::new();
        m.begin_transmission(0);
        m.begin_transmission(1);
        m.end_transmission(0);
        m.end_transmission(1);
        // Once clear again, a fresh transmission is not penalized.
        assert_eq!(m.begin_transmission(2), ChannelOutcome::Clear);
    }
}
