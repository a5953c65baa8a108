//! Simulation configuration.
//!
//! Plain structs with defaults, deserializable from scenario YAML. Optional
//! parameters stay `Option`s; the dependent computation is skipped when they
//! are absent rather than defaulted to a guess.

use rand::Rng;
use serde::Deserialize;

use crate::medium::MediumConfig;
use crate::scheduler::SimTime;
use crate::stats::StatsConfig;
use crate::traffic::TrafficConfig;

/// Which channel-access discipline every node in the run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacProtocol {
    /// Pure contention with uncoordinated exponential retry.
    RandomAccess,
    /// Carrier sensing with capped binary exponential backoff.
    CarrierSense,
    /// Control-message reservation on a fixed multi-hop schedule.
    Reservation,
    /// Deterministic time-division slots, collision-free.
    Slotted,
}

impl MacProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacProtocol::RandomAccess => "random_access",
            MacProtocol::CarrierSense => "carrier_sense",
            MacProtocol::Reservation => "reservation",
            MacProtocol::Slotted => "slotted",
        }
    }

    pub fn all() -> [MacProtocol; 4] {
        [
            MacProtocol::RandomAccess,
            MacProtocol::CarrierSense,
            MacProtocol::Reservation,
            MacProtocol::Slotted,
        ]
    }
}

/// Multi-hop relay parameters shared by the contention engines.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Medium traversals a packet needs before it counts as delivered.
    pub num_hops: u32,
    /// Upper bound of the uniform per-hop relay delay.
    pub hop_delay_max: SimTime,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            num_hops: 1,
            hop_delay_max: 0.01,
        }
    }
}

/// Random-access (pure contention) parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RandomAccessConfig {
    /// Mean of the exponential retry backoff.
    pub retx_mean: SimTime,
}

impl Default for RandomAccessConfig {
    fn default() -> Self {
        Self { retx_mean: 0.05 }
    }
}

/// Carrier-sense parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CarrierSenseConfig {
    /// Upper bound of the uniform pre-transmission sensing defer.
    pub defer_max: SimTime,
    /// Retry cap; one more collision abandons the packet.
    pub max_retries: u32,
    pub initial_backoff: SimTime,
    pub max_backoff: SimTime,
}

impl Default for CarrierSenseConfig {
    fn default() -> Self {
        Self {
            defer_max: 0.01,
            max_retries: 3,
            initial_backoff: 0.01,
            max_backoff: 0.16,
        }
    }
}

/// Reservation-access parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// Fixed per-hop reservation delay.
    pub rts_hop_delay: SimTime,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            rts_hop_delay: 0.01,
        }
    }
}

/// Full configuration for one simulation run.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Virtual-time horizon of the run.
    #[serde(default = "default_sim_time_limit")]
    pub sim_time_limit: SimTime,

    /// RNG seed (None = draw from entropy).
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_num_nodes")]
    pub num_nodes: usize,

    pub mac: MacProtocol,

    #[serde(default)]
    pub traffic: TrafficConfig,

    #[serde(default)]
    pub medium: MediumConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub random_access: RandomAccessConfig,

    #[serde(default)]
    pub carrier_sense: CarrierSenseConfig,

    #[serde(default)]
    pub reservation: ReservationConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

fn default_sim_time_limit() -> SimTime {
    50.0
}

fn default_num_nodes() -> usize {
    4
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sim_time_limit: default_sim_time_limit(),
            seed: None,
            num_nodes: default_num_nodes(),
            mac: MacProtocol::CarrierSense,
            traffic: TrafficConfig::default(),
            medium: MediumConfig::default(),
            relay: RelayConfig::default(),
            random_access: RandomAccessConfig::default(),
            carrier_sense: CarrierSenseConfig::default(),
            reservation: ReservationConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl SimConfig {
    /// Get or generate the run seed.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::thread_rng().gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::TrafficConfig;

    #[test]
    fn test_yaml_roundtrip_minimal() {
        let yaml = r#"
mac: slotted
num_nodes: 8
traffic:
  profile: periodic
  packet_interval: 0.05
"#;
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mac, MacProtocol::Slotted);
        assert_eq!(config.num_nodes, 8);
        assert_eq!(
            config.traffic,
            TrafficConfig::Periodic {
                packet_interval: 0.05
            }
        );
        // Defaults fill in the rest.
        assert_eq!(config.sim_time_limit, 50.0);
        assert!(config.stats.deadline.is_none());
        assert!(config.stats.failure_thresholds.is_none());
    }

    #[test]
    fn test_yaml_burst_profile_and_thresholds() {
        let yaml = r#"
mac: carrier_sense
sim_time_limit: 20.0
seed: 7
traffic:
  profile: periodic_with_burst
  base_interval: 0.2
  burst_interval: 1.0
  burst_size: 5
  inter_packet_in_burst: 0.002
carrier_sense:
  max_retries: 5
  initial_backoff: 0.005
stats:
  deadline: 0.1
  failure_thresholds:
    pdr: 0.9
    deadline_miss_rate: 0.05
    retry_exhaustion_rate: 0.02
"#;
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.carrier_sense.max_retries, 5);
        // Unspecified carrier-sense fields keep their defaults.
        assert_eq!(config.carrier_sense.max_backoff, 0.16);
        assert_eq!(config.stats.deadline, Some(0.1));
        let th = config.stats.failure_thresholds.unwrap();
        assert_eq!(th.pdr, 0.9);
        match config.traffic {
            TrafficConfig::PeriodicWithBurst { burst_size, .. } => assert_eq!(burst_size, 5),
            _ => panic!("expected burst profile"),
        }
    }

    #[test]
    fn test_resolve_seed_prefers_configured() {
        let config = SimConfig {
            seed: Some(99),
            ..Default::default()
        };
        assert_eq!(config.resolve_seed(), 99);
    }
}
