// Sweep Runner - automated experiment sweeps over node count, offered load,
// and access protocol.
//
// Usage:
//   cargo run --bin sweep_runner sweep.yaml
//   cargo run --bin sweep_runner sweep.yaml --dry-run
//
// Each run gets a unique experiment id, a derived seed, and its own output
// directory with a flat scalar CSV; a manifest.csv at the root lists every
// run. Execution and organization only, no result analysis.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use simple_logger::SimpleLogger;

use macsim::{CsvSink, MacProtocol, SimConfig, SimRunner, TrafficConfig};

#[derive(Debug, serde::Deserialize)]
struct SweepFile {
    #[serde(default = "default_base_seed")]
    base_seed: u64,

    #[serde(default = "default_sim_time_limit")]
    sim_time_limit: f64,

    #[serde(default = "default_node_counts")]
    node_counts: Vec<usize>,

    /// Offered load expressed as packet interval (shorter = heavier).
    #[serde(default = "default_offered_loads")]
    offered_loads: Vec<f64>,

    #[serde(default = "default_protocols")]
    protocols: Vec<MacProtocol>,

    #[serde(default = "default_results_root")]
    results_root: PathBuf,
}

fn default_base_seed() -> u64 {
    1000
}

fn default_sim_time_limit() -> f64 {
    50.0
}

fn default_node_counts() -> Vec<usize> {
    vec![4, 8]
}

fn default_offered_loads() -> Vec<f64> {
    vec![0.05, 0.1]
}

fn default_protocols() -> Vec<MacProtocol> {
    MacProtocol::all().to_vec()
}

fn default_results_root() -> PathBuf {
    PathBuf::from("results/sweep")
}

struct ManifestRow {
    experiment_id: usize,
    seed: u64,
    num_nodes: usize,
    packet_interval: f64,
    mac: MacProtocol,
    output_dir: PathBuf,
}

fn main() {
    SimpleLogger::new().init().unwrap();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <sweep.yaml> [--dry-run]", args[0]);
        std::process::exit(1);
    }
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let path = Path::new(&args[1]);
    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let sweep: SweepFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    if !dry_run {
        if let Err(e) = fs::create_dir_all(&sweep.results_root) {
            eprintln!("Failed to create {}: {}", sweep.results_root.display(), e);
            std::process::exit(1);
        }
    }

    let mut manifest: Vec<ManifestRow> = Vec::new();
    let mut exp_id = 0;

    for &num_nodes in &sweep.node_counts {
        for &load in &sweep.offered_loads {
            for &mac in &sweep.protocols {
                exp_id += 1;
                let seed = sweep.base_seed + exp_id as u64;
                let dir_name = format!(
                    "{:04}_nodes{}_load{}_{}",
                    exp_id,
                    num_nodes,
                    load,
                    mac.as_str()
                );
                let out_dir = sweep.results_root.join(&dir_name);

                manifest.push(ManifestRow {
                    experiment_id: exp_id,
                    seed,
                    num_nodes,
                    packet_interval: load,
                    mac,
                    output_dir: out_dir.clone(),
                });

                if dry_run {
                    info!(
                        "would run: nodes={} load={} mac={} -> {}",
                        num_nodes,
                        load,
                        mac.as_str(),
                        out_dir.display()
                    );
                    continue;
                }

                if let Err(e) = run_one(&out_dir, num_nodes, load, mac, seed, sweep.sim_time_limit)
                {
                    eprintln!("Experiment {}: {} -> failed: {}", exp_id, dir_name, e);
                    std::process::exit(1);
                }
                info!("Experiment {}: {} -> ok", exp_id, dir_name);
            }
        }
    }

    if dry_run {
        info!(
            "dry run: would write manifest to {}",
            sweep.results_root.join("manifest.csv").display()
        );
        return;
    }

    if let Err(e) = write_manifest(&sweep.results_root, &manifest) {
        eprintln!("Failed to write manifest: {}", e);
        std::process::exit(1);
    }
    info!(
        "Manifest written: {}",
        sweep.results_root.join("manifest.csv").display()
    );
}

fn run_one(
    out_dir: &Path,
    num_nodes: usize,
    packet_interval: f64,
    mac: MacProtocol,
    seed: u64,
    sim_time_limit: f64,
) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;

    let config = SimConfig {
        sim_time_limit,
        seed: Some(seed),
        num_nodes,
        mac,
        traffic: TrafficConfig::Periodic { packet_interval },
        ..Default::default()
    };

    let result = SimRunner::new(config).run();

    let csv_path = out_dir.join("scalars.csv");
    let mut sink = CsvSink::create(&csv_path)?;
    result.emit(&mut sink);
    sink.finish()
}

fn write_manifest(root: &Path, rows: &[ManifestRow]) -> std::io::Result<()> {
    let mut file = fs::File::create(root.join("manifest.csv"))?;
    writeln!(
        file,
        "experiment_id,seed,num_nodes,packet_interval,mac,output_dir"
    )?;
    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            row.experiment_id,
            row.seed,
            row.num_nodes,
            row.packet_interval,
            row.mac.as_str(),
            row.output_dir.display()
        )?;
    }
    Ok(())
}
