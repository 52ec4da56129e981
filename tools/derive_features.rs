//! Trip Feature Derivation Tool
//!
//! Configuration-driven command line front end for the windowed feature
//! pipeline: reads a trip-record CSV, derives trailing mean/std features per
//! origin-destination group, and writes the augmented CSV.
//!
//! # Usage
//!
//! ```bash
//! # Derive features using a TOML config
//! cargo run --release --bin derive_features -- \
//!     --config configs/ring_road.toml --input VehicleData.csv --output VehicleData_time.csv
//!
//! # Generate a sample config
//! cargo run --release --bin derive_features -- --generate-config configs/sample.toml
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process;
use tracing_subscriber::EnvFilter;
use trip_feature_extractor::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    match args[1].as_str() {
        "--config" => {
            let (config, input, output) = parse_run_args(&args);
            run(&config, &input, &output);
        }
        "--generate-config" => {
            if args.len() < 3 {
                eprintln!("Error: --generate-config requires a path argument");
                process::exit(1);
            }
            generate_sample_config(&args[2]);
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown argument: {}", args[1]);
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        r#"
Trip Feature Derivation Tool

Usage:
    {program} --config <path.toml> --input <trips.csv> --output <features.csv>
    {program} --generate-config <path>   Generate a sample config file
    {program} --help                     Show this help

Examples:
    # Derive six trailing travel-time windows per OD bucket
    {program} --config configs/ring_road.toml --input VehicleData.csv --output VehicleData_time.csv

    # Generate a sample config to edit
    {program} --generate-config configs/my_run.toml

For configuration options, see the generated sample config.
"#
    );
}

/// Pull `--config`, `--input` and `--output` values out of the argument list.
fn parse_run_args(args: &[String]) -> (String, String, String) {
    let mut config = None;
    let mut input = None;
    let mut output = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config = args.get(i + 1).cloned();
                i += 2;
            }
            "--input" => {
                input = args.get(i + 1).cloned();
                i += 2;
            }
            "--output" => {
                output = args.get(i + 1).cloned();
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
    }

    match (config, input, output) {
        (Some(c), Some(i), Some(o)) => (c, i, o),
        _ => {
            eprintln!("Error: --config, --input and --output are all required");
            process::exit(1);
        }
    }
}

fn run(config_path: &str, input: &str, output: &str) {
    let config = match PipelineConfig::load_toml(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {config_path}: {e}");
            process::exit(1);
        }
    };

    let pipeline = match Pipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    match pipeline.process_to(input, output) {
        Ok(result) => {
            println!("═══════════════════════════════════════════════════════");
            println!("Feature Derivation Complete");
            println!("═══════════════════════════════════════════════════════");
            println!("  Rows read:            {}", result.rows_read);
            println!("  Rows emitted:         {}", result.rows_emitted);
            println!("  Groups processed:     {}", result.groups_processed);
            println!("  Warm-up rows dropped: {}", result.warmup_rows_dropped);
            println!("  First-day rows dropped: {}", result.first_period_rows_dropped);
            println!("  Elapsed:              {:?}", result.elapsed);
            println!("═══════════════════════════════════════════════════════");
        }
        Err(e) => {
            eprintln!("Feature derivation failed: {e}");
            process::exit(1);
        }
    }
}

/// Write a default configuration, stamped with creation metadata, for the
/// user to edit.
fn generate_sample_config(path: &str) {
    let config = PipelineConfig::default().with_metadata(ExperimentMetadata::now("sample-run"));

    match config.save_toml(path) {
        Ok(()) => println!("Sample config written to {path}"),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            process::exit(1);
        }
    }
}
