//! Carrier-sense access: sensing defer plus capped binary exponential
//! backoff.
//!
//! Each packet starts with a uniform pre-transmission defer modeling carrier
//! sensing. A collision doubles the backoff up to `max_backoff`; once the
//! retry count exceeds `max_retries` the packet is abandoned (counted as
//! retries-exhausted, never delivered) and generation resumes.

use crate::config::{CarrierSenseConfig, RelayConfig};
use crate::engine::{AccessEngine, MacEvent, NodeCtx};
use crate::medium::ChannelOutcome;
use crate::scheduler::{NodeId, SimTime, TimerId};
use crate::stats::{StatsConfig, StatsEngine};
use crate::traffic::{TrafficConfig, TrafficSource};

pub struct CarrierSenseAccess {
    stats: StatsEngine,
    traffic: TrafficSource,
    relay: RelayConfig,
    config: CarrierSenseConfig,

    gen_time: SimTime,
    retry_count: u32,
    hops_completed: u32,
    tx: Option<TimerId>,
}

impl CarrierSenseAccess {
    pub fn new(
        node: NodeId,
        traffic: TrafficConfig,
        relay: RelayConfig,
        config: CarrierSenseConfig,
        stats: StatsConfig,
    ) -> Self {
        Self {
            stats: StatsEngine::new(node, stats),
            traffic: TrafficSource::new(traffic),
            relay,
            config,
            gen_time: 0.0,
            retry_count: 0,
            hops_completed: 0,
            tx: None,
        }
    }

    fn generate(&mut self, ctx: &mut NodeCtx<'_>) {
        self.stats.record_generation();
        self.gen_time = ctx.now();
        self.retry_count = 0;
        self.hops_completed = 0;
        let defer = ctx.draw_uniform(0.0, self.config.defer_max);
        self.tx = Some(ctx.schedule_after(defer, MacEvent::Transmit));
    }

    fn backoff_for(&self, retry_count: u32) -> SimTime {
        let backoff = self.config.initial_backoff * 2f64.powi(retry_count as i32 - 1);
        backoff.min(self.config.max_backoff)
    }
}

impl AccessEngine for CarrierSenseAccess {
    fn start(&mut self, ctx: &mut NodeCtx<'_>) {
        self.traffic.start(ctx);
    }

    fn handle(&mut self, ctx: &mut NodeCtx<'_>, fired: TimerId, event: MacEvent) {
        match event {
            MacEvent::Generate => {
                self.traffic.generation_fired(fired);
                self.generate(ctx);
            }
            MacEvent::BurstPacket => {
                self.traffic.burst_packet_fired(fired);
                self.generate(ctx);
            }
            MacEvent::BurstTrigger => {
                self.traffic.burst_triggered(ctx);
            }
            MacEvent::Transmit => {
                if self.tx == Some(fired) {
                    self.tx = None;
                }
                self.stats.record_attempt();
                ctx.begin_transmission();
            }
            MacEvent::Outcome(outcome) => {
                ctx.end_transmission();
                match outcome {
                    ChannelOutcome::Collided => {
                        self.stats.record_collision();
                        self.retry_count += 1;
                        if self.retry_count <= self.config.max_retries {
                            let backoff = self.backoff_for(self.retry_count);
                            self.tx = Some(ctx.schedule_after(backoff, MacEvent::Transmit));
                        } else {
                            self.stats.record_retry_exhausted();
                            self.traffic.schedule_next_generation(ctx);
                        }
                    }
                    ChannelOutcome::Clear => {
                        self.hops_completed += 1;
                        if self.hops_completed >= self.relay.num_hops {
                            self.stats.record_delivery(self.gen_time, ctx.now());
                            self.traffic.schedule_next_generation(ctx);
                        } else {
                            let delay = ctx.draw_uniform(0.0, self.relay.hop_delay_max);
                            self.tx = Some(ctx.schedule_after(delay, MacEvent::Transmit));
                        }
                    }
                }
            }
            _ => {} // not ours
        }
    }

    fn teardown(&mut self, ctx: &mut NodeCtx<'_>) {
        self.traffic.cancel_all(ctx);
        if let Some(id) = self.tx.take() {
            ctx.cancel(id);
        }
    }

    fn stats(&self) -> &StatsEngine {
        &self.stats
    }
}
