//! Traffic generation profiles and the timer bookkeeping behind them.
//!
//! Two profiles: steady periodic, and periodic with a superimposed burst
//! stream. The burst stream and the baseline stream run on independent
//! timers; neither suppresses the other. Generation is protocol-driven: the
//! next baseline generation is armed when the previous packet's handling
//! completes (delivery or abandonment), not by a fixed global timer.

use serde::Deserialize;

use crate::engine::{MacEvent, NodeCtx};
use crate::scheduler::{SimTime, TimerId};

/// Generation pattern selection and timing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum TrafficConfig {
    Periodic {
        packet_interval: SimTime,
    },
    PeriodicWithBurst {
        base_interval: SimTime,
        burst_interval: SimTime,
        burst_size: u32,
        inter_packet_in_burst: SimTime,
    },
}

impl TrafficConfig {
    /// Interval between baseline generations.
    pub fn generation_interval(&self) -> SimTime {
        match *self {
            TrafficConfig::Periodic { packet_interval } => packet_interval,
            TrafficConfig::PeriodicWithBurst { base_interval, .. } => base_interval,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        TrafficConfig::Periodic {
            packet_interval: 0.1,
        }
    }
}

/// Owns the generation-side timer slots for one contention engine.
pub struct TrafficSource {
    config: TrafficConfig,
    generation: Option<TimerId>,
    burst_trigger: Option<TimerId>,
    burst_packets: Vec<TimerId>,
}

impl TrafficSource {
    pub fn new(config: TrafficConfig) -> Self {
        Self {
            config,
            generation: None,
            burst_trigger: None,
            burst_packets: Vec::new(),
        }
    }

    /// Arm the initial timers: first generation at a uniform random offset
    /// within one interval, plus the burst trigger when configured.
    pub fn start(&mut self, ctx: &mut NodeCtx<'_>) {
        let interval = self.config.generation_interval();
        let offset = ctx.draw_uniform(0.0, interval);
        self.generation = Some(ctx.schedule_after(offset, MacEvent::Generate));

        if let TrafficConfig::PeriodicWithBurst { burst_interval, .. } = self.config {
            self.burst_trigger = Some(ctx.schedule_after(burst_interval, MacEvent::BurstTrigger));
        }
    }

    /// Arm the next baseline generation, superseding any pending one.
    pub fn schedule_next_generation(&mut self, ctx: &mut NodeCtx<'_>) {
        if let Some(id) = self.generation.take() {
            ctx.cancel(id);
        }
        let interval = self.config.generation_interval();
        self.generation = Some(ctx.schedule_after(interval, MacEvent::Generate));
    }

    /// Book-keeping when the baseline generation timer fires.
    pub fn generation_fired(&mut self, fired: TimerId) {
        if self.generation == Some(fired) {
            self.generation = None;
        }
    }

    /// Book-keeping when one burst packet fires.
    pub fn burst_packet_fired(&mut self, fired: TimerId) {
        self.burst_packets.retain(|id| *id != fired);
    }

    /// Enqueue one burst of generation events and re-arm the trigger.
    pub fn burst_triggered(&mut self, ctx: &mut NodeCtx<'_>) {
        if let TrafficConfig::PeriodicWithBurst {
            burst_interval,
            burst_size,
            inter_packet_in_burst,
            ..
        } = self.config
        {
            for k in 0..burst_size {
                let id =
                    ctx.schedule_after(k as SimTime * inter_packet_in_burst, MacEvent::BurstPacket);
                self.burst_packets.push(id);
            }
            self.burst_trigger = Some(ctx.schedule_after(burst_interval, MacEvent::BurstTrigger));
        }
    }

    /// Cancel every pending generation-side timer.
    pub fn cancel_all(&mut self, ctx: &mut NodeCtx<'_>) {
        if let Some(id) = self.generation.take() {
            ctx.cancel(id);
        }
        if let Some(id) = self.burst_trigger.take() {
            ctx.cancel(id);
        }
        for id in self.burst_packets.drain(..) {
            ctx.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testkit::Harness;

    #[test]
    fn test_periodic_first_generation_within_one_interval() {
        let mut h = Harness::new(11);
        let mut ts = TrafficSource::new(TrafficConfig::Periodic {
            packet_interval: 0.5,
        });
        ts.start(&mut h.ctx(0));

        let t = h.queue.peek_time().unwrap();
        assert!((0.0..0.5).contains(&t));
    }

    #[test]
    fn test_burst_trigger_enqueues_spaced_packets_and_rearms() {
        let mut h = Harness::new(11);
        let config = TrafficConfig::PeriodicWithBurst {
            base_interval: 10.0,
            burst_interval: 2.0,
            burst_size: 3,
            inter_packet_in_burst: 0.01,
        };
        let mut ts = TrafficSource::new(config);
        ts.burst_triggered(&mut h.ctx(0));

        let mut packets = Vec::new();
        let mut triggers = Vec::new();
        while let Some((_, _, ev)) = h.queue.pop_before(100.0) {
            match ev {
                MacEvent::BurstPacket => packets.push(h.queue.now()),
                MacEvent::BurstTrigger => triggers.push(h.queue.now()),
                _ => {}
            }
        }
        assert_eq!(packets, vec![0.0, 0.01, 0.02]);
        assert_eq!(triggers, vec![2.0]);
    }

    #[test]
    fn test_schedule_next_generation_supersedes_pending() {
        let mut h = Harness::new(11);
        let mut ts = TrafficSource::new(TrafficConfig::Periodic {
            packet_interval: 1.0,
        });
        ts.start(&mut h.ctx(0));
        ts.schedule_next_generation(&mut h.ctx(0));

        // Only the superseding timer remains.
        let mut fired = 0;
        while h.queue.pop_before(100.0).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_cancel_all_clears_every_slot() {
        let mut h = Harness::new(11);
        let config = TrafficConfig::PeriodicWithBurst {
            base_interval: 1.0,
            burst_interval: 2.0,
            burst_size: 4,
            inter_packet_in_burst: 0.01,
        };
        let mut ts = TrafficSource::new(config);
        ts.start(&mut h.ctx(0));
        ts.burst_triggered(&mut h.ctx(0));
        ts.cancel_all(&mut h.ctx(0));

        assert!(h.queue.pop_before(100.0).is_none());
    }
}
