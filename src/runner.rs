//! Simulation runner: builds one engine per node on a shared medium, drives
//! the event loop, and finalizes metrics.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{MacProtocol, SimConfig};
use crate::engine::{AccessEngine, MacEvent, NodeCtx};
use crate::mac_csma::CarrierSenseAccess;
use crate::mac_random::RandomAccess;
use crate::mac_rts::ReservationAccess;
use crate::mac_tdma::DeterministicSlotAccess;
use crate::medium::SharedMedium;
use crate::scheduler::{EventQueue, SimTime};
use crate::stats::{MetricSet, MetricSink};

/// Owns everything for one run.
pub struct SimRunner {
    config: SimConfig,
    seed: u64,
    queue: EventQueue<MacEvent>,
    rng: StdRng,
    medium: SharedMedium,
    nodes: Vec<Box<dyn AccessEngine>>,
}

impl SimRunner {
    pub fn new(config: SimConfig) -> Self {
        let seed = config.resolve_seed();
        let mut runner = Self {
            seed,
            queue: EventQueue::new(),
            rng: StdRng::seed_from_u64(seed),
            medium: SharedMedium::new(),
            nodes: Vec::new(),
            config,
        };
        runner.build_nodes();
        runner
    }

    fn build_nodes(&mut self) {
        let c = self.config.clone();
        let c = &c;
        for node in 0..c.num_nodes {
            let engine: Box<dyn AccessEngine> = match c.mac {
                MacProtocol::RandomAccess => Box::new(RandomAccess::new(
                    node,
                    c.traffic,
                    c.relay,
                    c.random_access,
                    c.stats,
                )),
                MacProtocol::CarrierSense => Box::new(CarrierSenseAccess::new(
                    node,
                    c.traffic,
                    c.relay,
                    c.carrier_sense,
                    c.stats,
                )),
                MacProtocol::Reservation => Box::new(ReservationAccess::new(
                    node,
                    c.traffic,
                    c.relay.num_hops,
                    c.reservation,
                    c.stats,
                )),
                MacProtocol::Slotted => Box::new(DeterministicSlotAccess::new(
                    node,
                    c.num_nodes,
                    c.traffic.generation_interval(),
                    c.relay.num_hops,
                    c.stats,
                )),
            };
            self.nodes.push(engine);
        }
    }

    /// Run to the configured horizon and finalize.
    pub fn run(mut self) -> SimResult {
        info!(
            "starting run: mac={} nodes={} limit={}s seed={}",
            self.config.mac.as_str(),
            self.config.num_nodes,
            self.config.sim_time_limit,
            self.seed
        );

        let hold = self.config.medium.hold_time;
        for node in 0..self.nodes.len() {
            let mut ctx = NodeCtx::new(
                node,
                &mut self.queue,
                &mut self.medium,
                &mut self.rng,
                hold,
            );
            self.nodes[node].start(&mut ctx);
        }

        let limit = self.config.sim_time_limit;
        while let Some((node, fired, event)) = self.queue.pop_before(limit) {
            let mut ctx = NodeCtx::new(
                node,
                &mut self.queue,
                &mut self.medium,
                &mut self.rng,
                hold,
            );
            self.nodes[node].handle(&mut ctx, fired, event);
        }

        // Teardown: every engine drops every timer it still owns.
        for node in 0..self.nodes.len() {
            let mut ctx = NodeCtx::new(
                node,
                &mut self.queue,
                &mut self.medium,
                &mut self.rng,
                hold,
            );
            self.nodes[node].teardown(&mut ctx);
        }

        let node_metrics: Vec<MetricSet> = self.nodes.iter().map(|n| n.stats().finalize()).collect();

        SimResult {
            seed: self.seed,
            end_time: self.queue.now(),
            node_metrics,
        }
    }
}

/// Finalized per-node scalar sets for one run.
pub struct SimResult {
    pub seed: u64,
    pub end_time: SimTime,
    pub node_metrics: Vec<MetricSet>,
}

impl SimResult {
    /// Send every node's scalars to a sink.
    pub fn emit(&self, sink: &mut dyn MetricSink) {
        for (node, metrics) in self.node_metrics.iter().enumerate() {
            metrics.emit(node, sink);
        }
    }

    /// Sum of one counter across nodes (absent scalars count as zero).
    pub fn total(&self, name: &str) -> f64 {
        self.node_metrics
            .iter()
            .filter_map(|m| m.get(name))
            .sum()
    }

    /// Delivered / generated across the whole network.
    pub fn network_pdr(&self) -> f64 {
        let generated = self.total("Generated");
        if generated > 0.0 {
            self.total("Delivered") / generated
        } else {
            0.0
        }
    }

    /// True when any node raised its AnyFailure flag.
    pub fn any_failure(&self) -> bool {
        self.node_metrics
            .iter()
            .any(|m| m.get("AnyFailure") == Some(1.0))
    }

    pub fn print_summary(&self) {
        info!("run complete: t={:.3}s seed={}", self.end_time, self.seed);
        info!(
            "  generated={} delivered={} attempts={} collisions={} exhausted={}",
            self.total("Generated"),
            self.total("Delivered"),
            self.total("TX_Attempts"),
            self.total("Collisions"),
            self.total("RetriesExhausted"),
        );
        info!("  network PDR: {:.4}", self.network_pdr());
        for (node, m) in self.node_metrics.iter().enumerate() {
            let delay = m
                .get("E2EDelayMean")
                .map(|d| format!("{:.4}s", d))
                .unwrap_or_else(|| "-".to_string());
            info!(
                "  node {}: gen={} dlv={} pdr={:.3} mean-delay={}",
                node,
                m.get("Generated").unwrap_or(0.0),
                m.get("Delivered").unwrap_or(0.0),
                m.get("PDR").unwrap_or(0.0),
                delay,
            );
        }
        if self.any_failure() {
            info!("  failure thresholds breached (see warnings above)");
        }
    }
}
