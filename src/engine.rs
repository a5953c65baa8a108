//! Common seam between the scheduling substrate and the access engines.
//!
//! An engine is a timer-driven state machine: it never blocks, it only
//! schedules future events and reacts to the ones that fire. `NodeCtx` is the
//! narrow view of the substrate (clock, timers, variates) plus the shared
//! medium that one engine sees while handling one event.

use rand::rngs::StdRng;

use crate::medium::{ChannelOutcome, SharedMedium};
use crate::scheduler::{self, EventQueue, NodeId, SimTime, TimerId};
use crate::stats::StatsEngine;

/// Event kinds delivered to access engines. Kinds an engine does not use are
/// dropped silently by that engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MacEvent {
    /// Baseline generation timer fired: produce one packet now.
    Generate,
    /// Burst trigger fired: enqueue a burst of generation events.
    BurstTrigger,
    /// One packet of a burst is due.
    BurstPacket,
    /// Deferred/backed-off transmission is due (carrier-sense).
    Transmit,
    /// Retry after collision backoff (random access).
    Retry,
    /// Next relay hop is due (random access).
    Hop,
    /// Next reservation hop is due.
    ReservationHop,
    /// This node's time-division slot arrived.
    SlotFire,
    /// Medium outcome for an earlier transmission arrived back.
    Outcome(ChannelOutcome),
}

/// Per-event view of the substrate handed to an engine.
pub struct NodeCtx<'a> {
    pub node: NodeId,
    queue: &'a mut EventQueue<MacEvent>,
    medium: &'a mut SharedMedium,
    rng: &'a mut StdRng,
    hold_time: SimTime,
}

impl<'a> NodeCtx<'a> {
    pub fn new(
        node: NodeId,
        queue: &'a mut EventQueue<MacEvent>,
        medium: &'a mut SharedMedium,
        rng: &'a mut StdRng,
        hold_time: SimTime,
    ) -> Self {
        Self {
            node,
            queue,
            medium,
            rng,
            hold_time,
        }
    }

    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    pub fn schedule_after(&mut self, delay: SimTime, event: MacEvent) -> TimerId {
        self.queue.schedule_after(delay, self.node, event)
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.queue.cancel(id);
    }

    pub fn draw_uniform(&mut self, lo: f64, hi: f64) -> f64 {
        scheduler::draw_uniform(self.rng, lo, hi)
    }

    pub fn draw_exponential(&mut self, mean: f64) -> f64 {
        scheduler::draw_exponential(self.rng, mean)
    }

    /// Start a transmission on the shared medium. The outcome sensed at start
    /// comes back to this node as an `Outcome` event after the medium hold
    /// time.
    pub fn begin_transmission(&mut self) {
        let outcome = self.medium.begin_transmission(self.node);
        let hold = self.hold_time;
        self.schedule_after(hold, MacEvent::Outcome(outcome));
    }

    /// Release the medium for a transmission begun earlier.
    pub fn end_transmission(&mut self) {
        self.medium.end_transmission(self.node);
    }
}

/// A channel-access state machine for one node.
pub trait AccessEngine {
    /// Arm initial timers.
    fn start(&mut self, ctx: &mut NodeCtx<'_>);

    /// React to a fired event. `fired` is the handle the event was scheduled
    /// under, for engines that track named timer slots.
    fn handle(&mut self, ctx: &mut NodeCtx<'_>, fired: TimerId, event: MacEvent);

    /// Cancel every timer this engine still owns. Called on every exit path.
    fn teardown(&mut self, ctx: &mut NodeCtx<'_>);

    fn stats(&self) -> &StatsEngine;
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Single-engine harness for driving a state machine in isolation.

    use rand::SeedableRng;

    use super::*;

    pub(crate) struct Harness {
        pub queue: EventQueue<MacEvent>,
        pub medium: SharedMedium,
        pub rng: StdRng,
        pub hold_time: SimTime,
    }

    impl Harness {
        pub fn new(seed: u64) -> Self {
            Self {
                queue: EventQueue::new(),
                medium: SharedMedium::new(),
                rng: StdRng::seed_from_u64(seed),
                hold_time: 0.001,
            }
        }

        pub fn ctx(&mut self, node: NodeId) -> NodeCtx<'_> {
            NodeCtx::new(
                node,
                &mut self.queue,
                &mut self.medium,
                &mut self.rng,
                self.hold_time,
            )
        }

        /// Drive a single engine (node 0) until `limit`.
        pub fn run(&mut self, engine: &mut dyn AccessEngine, limit: SimTime) {
            while let Some((node, fired, event)) = self.queue.pop_before(limit) {
                let mut ctx = NodeCtx::new(
                    node,
                    &mut self.queue,
                    &mut self.medium,
                    &mut self.rng,
                    self.hold_time,
                );
                engine.handle(&mut ctx, fired, event);
            }
        }
    }
}
