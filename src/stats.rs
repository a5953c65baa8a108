//! Per-node statistics, derived metrics, and failure-threshold evaluation.
//!
//! Every access engine owns one `StatsEngine`. Counters are updated through
//! the recording methods as the protocol runs; `finalize` turns them into the
//! flat named-scalar set that gets persisted. Threshold breaches are metrics
//! plus a warning, never an abort.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;

use crate::scheduler::{NodeId, SimTime};

/// Optional statistics parameters. Absent fields disable the dependent
/// computation entirely; nothing is defaulted.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// End-to-end delay budget; deliveries slower than this count as misses.
    pub deadline: Option<SimTime>,

    /// Failure-flag thresholds, all-or-nothing.
    pub failure_thresholds: Option<FailureThresholds>,
}

/// Thresholds for the boolean failure flags.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FailureThresholds {
    /// Fail when PDR drops below this.
    pub pdr: f64,
    /// Fail when the deadline-miss ratio exceeds this.
    pub deadline_miss_rate: f64,
    /// Fail when retriesExhausted / generated exceeds this.
    pub retry_exhaustion_rate: f64,
}

/// Ordered named-scalar metric set for one node.
#[derive(Debug, Clone, Default)]
pub struct MetricSet {
    values: IndexMap<&'static str, f64>,
}

impl MetricSet {
    fn push(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Send every scalar to a sink, in order.
    pub fn emit(&self, node: NodeId, sink: &mut dyn MetricSink) {
        for (name, value) in self.iter() {
            sink.emit_scalar(node, name, value);
        }
    }
}

/// Per-node counter and accumulator state.
pub struct StatsEngine {
    node: NodeId,
    config: StatsConfig,

    generated: u64,
    tx_attempts: u64,
    collisions: u64,
    delivered: u64,
    retries_exhausted: u64,
    deadline_misses: u64,

    sum_delay: f64,
    sum_delay_sq: f64,
    max_delay: f64,
}

impl StatsEngine {
    pub fn new(node: NodeId, config: StatsConfig) -> Self {
        Self {
            node,
            config,
            generated: 0,
            tx_attempts: 0,
            collisions: 0,
            delivered: 0,
            retries_exhausted: 0,
            deadline_misses: 0,
            sum_delay: 0.0,
            sum_delay_sq: 0.0,
            max_delay: 0.0,
        }
    }

    pub fn record_generation(&mut self) {
        self.generated += 1;
    }

    pub fn record_attempt(&mut self) {
        self.tx_attempts += 1;
    }

    pub fn record_collision(&mut self) {
        self.collisions += 1;
    }

    pub fn record_retry_exhausted(&mut self) {
        self.retries_exhausted += 1;
    }

    /// Record a completed delivery. `now - gen_time` is the end-to-end delay.
    pub fn record_delivery(&mut self, gen_time: SimTime, now: SimTime) {
        self.delivered += 1;
        let d = now - gen_time;
        self.sum_delay += d;
        self.sum_delay_sq += d * d;
        if d > self.max_delay {
            self.max_delay = d;
        }
        if let Some(deadline) = self.config.deadline {
            if d > deadline {
                self.deadline_misses += 1;
            }
        }
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn tx_attempts(&self) -> u64 {
        self.tx_attempts
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn retries_exhausted(&self) -> u64 {
        self.retries_exhausted
    }

    fn pdr(&self) -> f64 {
        if self.generated > 0 {
            self.delivered as f64 / self.generated as f64
        } else {
            0.0
        }
    }

    /// Produce the flat scalar set for this node. Delay-derived metrics are
    /// only present when something was delivered; deadline metrics only when
    /// a deadline is configured; failure flags only when thresholds are
    /// configured.
    pub fn finalize(&self) -> MetricSet {
        let mut m = MetricSet::default();

        m.push("Generated", self.generated as f64);
        m.push("TX_Attempts", self.tx_attempts as f64);
        m.push("Collisions", self.collisions as f64);
        m.push("Delivered", self.delivered as f64);
        m.push("RetriesExhausted", self.retries_exhausted as f64);
        m.push("PDR", self.pdr());

        if self.delivered > 0 {
            let n = self.delivered as f64;
            let mean = self.sum_delay / n;
            let mut variance = self.sum_delay_sq / n - mean * mean;
            // Floating-point cancellation can push this slightly negative.
            if variance < 0.0 {
                variance = 0.0;
            }
            m.push("E2EDelayMean", mean);
            m.push("E2EDelayMax", self.max_delay);
            m.push("E2EDelayJitter", variance.sqrt());
        }

        if self.config.deadline.is_some() {
            m.push("DeadlineMisses", self.deadline_misses as f64);
            if self.delivered > 0 {
                m.push(
                    "DeadlineMissRatio",
                    self.deadline_misses as f64 / self.delivered as f64,
                );
            }
        }

        if self.delivered > 0 {
            m.push(
                "AvgTxAttemptsPerDelivery",
                self.tx_attempts as f64 / self.delivered as f64,
            );
        }

        if let Some(th) = self.config.failure_thresholds {
            let flags = self.evaluate_failure_thresholds(&th);
            m.push("PDRFailure", flags.pdr_fail as u8 as f64);
            m.push("DeadlineMissRateFailure", flags.deadline_fail as u8 as f64);
            m.push("RetryExhaustionRateFailure", flags.retry_fail as u8 as f64);
            m.push("AnyFailure", flags.any() as u8 as f64);
        }

        m
    }

    fn evaluate_failure_thresholds(&self, th: &FailureThresholds) -> FailureFlags {
        let pdr = self.pdr();
        let pdr_fail = self.generated > 0 && pdr < th.pdr;
        if pdr_fail {
            warn!(
                "node {}: PDR {:.3} below failure threshold {:.3}",
                self.node, pdr, th.pdr
            );
        }

        let mut deadline_fail = false;
        if self.delivered > 0 {
            let miss_ratio = self.deadline_misses as f64 / self.delivered as f64;
            deadline_fail = miss_ratio > th.deadline_miss_rate;
            if deadline_fail {
                warn!(
                    "node {}: deadline-miss ratio {:.3} above failure threshold {:.3}",
                    self.node, miss_ratio, th.deadline_miss_rate
                );
            }
        }

        let mut retry_fail = false;
        if self.generated > 0 {
            let rate = self.retries_exhausted as f64 / self.generated as f64;
            retry_fail = rate > th.retry_exhaustion_rate;
            if retry_fail {
                warn!(
                    "node {}: retry-exhaustion rate {:.3} above failure threshold {:.3}",
                    self.node, rate, th.retry_exhaustion_rate
                );
            }
        }

        FailureFlags {
            pdr_fail,
            deadline_fail,
            retry_fail,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FailureFlags {
    pdr_fail: bool,
    deadline_fail: bool,
    retry_fail: bool,
}

impl FailureFlags {
    fn any(&self) -> bool {
        self.pdr_fail || self.deadline_fail || self.retry_fail
    }
}

/// Destination for finalized scalars.
pub trait MetricSink {
    fn emit_scalar(&mut self, node: NodeId, name: &str, value: f64);
}

/// In-memory sink for tests and sweep postprocessing.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub scalars: Vec<(NodeId, String, f64)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId, name: &str) -> Option<f64> {
        self.scalars
            .iter()
            .find(|(n, k, _)| *n == node && k == name)
            .map(|(_, _, v)| *v)
    }
}

impl MetricSink for RecordingSink {
    fn emit_scalar(&mut self, node: NodeId, name: &str, value: f64) {
        self.scalars.push((node, name.to_string(), value));
    }
}

/// Flat `node,name,value` CSV sink for external analysis.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "node,name,value")?;
        Ok(Self { writer })
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl MetricSink for CsvSink {
    fn emit_scalar(&mut self, node: NodeId, name: &str, value: f64) {
        // Sink errors are not simulation failures; drop them.
        let _ = writeln!(self.writer, "{},{},{}", node, name, value);
    }
}
