//! Random access: pure contention with uncoordinated exponential retry.
//!
//! Every generation transmits immediately. A collided outcome schedules a
//! retry after an exponentially distributed backoff with no retry cap; a
//! clear outcome advances the hop relay, and the final hop records the
//! delivery and resumes generation.

use crate::config::{RandomAccessConfig, RelayConfig};
use crate::engine::{AccessEngine, MacEvent, NodeCtx};
use crate::medium::ChannelOutcome;
use crate::scheduler::{NodeId, SimTime, TimerId};
use crate::stats::{StatsConfig, StatsEngine};
use crate::traffic::{TrafficConfig, TrafficSource};

pub struct RandomAccess {
    stats: StatsEngine,
    traffic: TrafficSource,
    relay: RelayConfig,
    retx_mean: SimTime,

    gen_time: SimTime,
    hops_completed: u32,
    retry: Option<TimerId>,
    hop: Option<TimerId>,
}

impl RandomAccess {
    pub fn new(
        node: NodeId,
        traffic: TrafficConfig,
        relay: RelayConfig,
        config: RandomAccessConfig,
        stats: StatsConfig,
    ) -> Self {
        Self {
            stats: StatsEngine::new(node, stats),
            traffic: TrafficSource::new(traffic),
            relay,
            retx_mean: config.retx_mean,
            gen_time: 0.0,
            hops_completed: 0,
            retry: None,
            hop: None,
        }
    }

    fn generate(&mut self, ctx: &mut NodeCtx<'_>) {
        self.stats.record_generation();
        self.stats.record_attempt();
        self.gen_time = ctx.now();
        self.hops_completed = 0;
        ctx.begin_transmission();
    }
}

impl AccessEngine for RandomAccess {
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
            MacEvent::Retry => {
                if self.retry == Some(fired) {
                    self.retry = None;
                }
                self.stats.record_attempt();
                ctx.begin_transmission();
            }
            MacEvent::Hop => {
                if self.hop == Some(fired) {
                    self.hop = None;
                }
                self.stats.record_attempt();
                ctx.begin_transmission();
            }
            MacEvent::Outcome(outcome) => {
                ctx.end_transmission();
                match outcome {
                    ChannelOutcome::Collided => {
                        self.stats.record_collision();
                        let backoff = ctx.draw_exponential(self.retx_mean);
                        self.retry = Some(ctx.schedule_after(backoff, MacEvent::Retry));
                    }
                    ChannelOutcome::Clear => {
                        self.hops_completed += 1;
                        if self.hops_completed >= self.relay.num_hops {
                            self.stats.record_delivery(self.gen_time, ctx.now());
                            self.traffic.schedule_next_generation(ctx);
                        } else {
                            let delay = ctx.draw_uniform(0.0, self.relay.hop_delay_max);
                            self.hop = Some(ctx.schedule_after(delay, MacEvent::Hop));
                        }
                    }
                }
            }
            _ => {} // not ours
        }
    }

    fn teardown(&mut self, ctx: &mut NodeCtx<'_>) {
        self.traffic.cancel_all(ctx);
        if let Some(id) = self.retry.take() {
            ctx.cancel(id);
        }
        if let Some(id) = self.hop.take() {
            ctx.cancel(id);
        }
    }

    fn stats(&self) -> &StatsEngine {
        &self.stats
    }
}
