//! # macsim - Channel-Access Discipline Simulator
//!
//! Discrete-event evaluation of medium-access disciplines contending on a
//! shared broadcast medium. For a given traffic load and node count, a run
//! reports the packet delivery ratio, collision rate, retry-exhaustion rate,
//! and end-to-end delay distribution of the configured access protocol, and
//! checks them against optional delivery/deadline failure thresholds.
//!
//! ## Core Components
//!
//! - **SharedMedium**: one broadcast domain; flags causally-late overlapping
//!   transmissions as collisions
//! - **StatsEngine**: per-node counters, derived metrics, failure thresholds
//! - **TrafficSource**: periodic or periodic-with-burst generation
//! - **Access engines**: `RandomAccess`, `CarrierSenseAccess`,
//!   `ReservationAccess`, `DeterministicSlotAccess` — the four channel-access
//!   state machines
//! - **SimRunner**: builds N engines on one medium, drives the event loop,
//!   finalizes metrics
//!
//! ## Usage
//!
//! ```no_run
//! use macsim::{MacProtocol, SimConfig, SimRunner};
//!
//! let config = SimConfig {
//!     sim_time_limit: 50.0,
//!     num_nodes: 8,
//!     mac: MacProtocol::CarrierSense,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let result = SimRunner::new(config).run();
//! result.print_summary();
//! ```
//!
//! Everything runs single-threaded on one virtual clock; "waiting" is always
//! a scheduled callback, never a blocking call. Same-time events fire in
//! scheduling order, so a fixed seed reproduces a run exactly.

// Scheduling substrate and the engine seam
pub mod engine;
pub mod scheduler;

// Shared medium and statistics
pub mod medium;
pub mod stats;

// Traffic generation
pub mod traffic;

// The four channel-access disciplines
pub mod mac_csma;
pub mod mac_random;
pub mod mac_rts;
pub mod mac_tdma;

// Configuration, run orchestration, protocol selection
pub mod config;
pub mod runner;
pub mod selector;

// Re-export commonly used types
pub use config::{
    CarrierSenseConfig, MacProtocol, RandomAccessConfig, RelayConfig, ReservationConfig, SimConfig,
};
pub use engine::{AccessEngine, MacEvent, NodeCtx};
pub use mac_csma::CarrierSenseAccess;
pub use mac_random::RandomAccess;
pub use mac_rts::ReservationAccess;
pub use mac_tdma::DeterministicSlotAccess;
pub use medium::{ChannelOutcome, MediumConfig, SharedMedium};
pub use runner::{SimResult, SimRunner};
pub use scheduler::{EventQueue, NodeId, SimTime, TimerId};
pub use selector::{classify_load, select_protocol, LatencySensitivity, OfferedLoad};
pub use stats::{
    CsvSink, FailureThresholds, MetricSet, MetricSink, RecordingSink, StatsConfig, StatsEngine,
};
pub use traffic::{TrafficConfig, TrafficSource};
