// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/csma_baseline.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/csma_baseline.yaml --seed 42

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use simple_logger::SimpleLogger;

use macsim::{CsvSink, SimConfig, SimRunner};

/// Scenario file format: metadata plus a full simulation config.
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    meta: ScenarioMeta,

    config: SimConfig,

    /// Optional path for a flat scalar CSV export.
    #[serde(default)]
    csv_output: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

fn main() {
    SimpleLogger::new().init().unwrap();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/csma_baseline.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/csma_baseline.yaml --seed 42", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed override
    let seed: Option<u64> = if args.len() >= 4 && args[2] == "--seed" {
        match args[3].parse() {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("Invalid seed {}: {}", args[3], e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    if path.is_file() {
        run_scenario_file(path, seed);
    } else if path.is_dir() {
        run_scenario_directory(path, seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<u64>) {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    info!("Found {} scenario(s) to run", scenarios.len());
    for (i, scenario_path) in scenarios.iter().enumerate() {
        info!(
            "{}/{} Running: {}",
            i + 1,
            scenarios.len(),
            scenario_path.display()
        );
        run_scenario_file(scenario_path, seed);
    }
    info!("All scenarios complete");
}

fn run_scenario_file(path: &Path, seed: Option<u64>) {
    info!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    if let Some(ref name) = scenario.meta.name {
        info!("Scenario: {}", name);
    }
    if let Some(ref desc) = scenario.meta.description {
        info!("{}", desc);
    }
    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        info!("Hypothesis: {}", hypothesis);
    }

    let mut config = scenario.config;
    if seed.is_some() {
        config.seed = seed;
    }

    let result = SimRunner::new(config).run();
    result.print_summary();

    if let Some(ref csv_path) = scenario.csv_output {
        match CsvSink::create(csv_path) {
            Ok(mut sink) => {
                result.emit(&mut sink);
                if let Err(e) = sink.finish() {
                    eprintln!("Failed to flush {}: {}", csv_path.display(), e);
                } else {
                    info!("Scalars exported to: {}", csv_path.display());
                }
            }
            Err(e) => eprintln!("Failed to create {}: {}", csv_path.display(), e),
        }
    }

    info!("Scenario complete");
}
