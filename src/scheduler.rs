//! Discrete-event scheduling substrate.
//!
//! Virtual clock, future-event queue, and random-variate helpers. The MAC
//! engines never touch this directly; they see the narrow `NodeCtx` view in
//! `engine.rs`. Events scheduled for the same virtual time are delivered in
//! scheduling order (timer ids are monotone, so the id doubles as the FIFO
//! tie-break).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::Rng;

/// Virtual simulation time in seconds.
pub type SimTime = f64;

/// Index of a node within one simulation run.
pub type NodeId = usize;

/// Opaque handle to a pending scheduled event. Compared by id, never by
/// reference; a handle stays valid until the event fires or is cancelled.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TimerId(u64);

struct Scheduled<E> {
    time: SimTime,
    id: TimerId,
    node: NodeId,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the earliest (time, id) first.
        other
            .time
            .total_cmp(&self.time)
            .then(other.id.0.cmp(&self.id.0))
    }
}

/// Future-event queue with lazy cancellation.
pub struct EventQueue<E> {
    now: SimTime,
    heap: BinaryHeap<Scheduled<E>>,
    cancelled: HashSet<TimerId>,
    next_id: u64,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `event` for `node`, `delay` seconds from now. Negative delays
    /// are clamped to zero.
    pub fn schedule_after(&mut self, delay: SimTime, node: NodeId, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Scheduled {
            time: self.now + delay.max(0.0),
            id,
            node,
            event,
        });
        id
    }

    /// Cancel a pending event. Cancelling an already-fired or unknown id is a
    /// no-op.
    pub fn cancel(&mut self, id: TimerId) {
        self.cancelled.insert(id);
    }

    /// Pop the next event at or before `limit`, advancing the clock to its
    /// time. Returns `None` (and advances the clock to `limit`) when nothing
    /// is due.
    pub fn pop_before(&mut self, limit: SimTime) -> Option<(NodeId, TimerId, E)> {
        loop {
            let due = matches!(self.heap.peek(), Some(top) if top.time <= limit);
            if !due {
                if limit > self.now {
                    self.now = limit;
                }
                return None;
            }
            let entry = self.heap.pop().unwrap();
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            if entry.time > self.now {
                self.now = entry.time;
            }
            return Some((entry.node, entry.id, entry.event));
        }
    }

    /// Time of the next live event, if any.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        loop {
            let head = self.heap.peek().map(|top| (top.time, top.id));
            match head {
                None => return None,
                Some((time, id)) => {
                    if !self.cancelled.contains(&id) {
                        return Some(time);
                    }
                    self.heap.pop();
                    self.cancelled.remove(&id);
                }
            }
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek_time().is_none()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform draw in `[lo, hi)`. Degenerate ranges return `lo`.
pub fn draw_uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

/// Exponential draw with the given mean, via inverse CDF.
pub fn draw_exponential(rng: &mut StdRng, mean: f64) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    let u: f64 = rng.gen();
    -mean * (1.0 - u).ln()
}
