//! Anchorage CLI
//!
//! Usage:
//!   anchorage [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Anchoring configuration (TOML format)
//!   --lint               Report structural problems in the result
//!   --verify             Replay the anchors and report misplaced boxes
//!   --compact            Print single-line JSON
//!   -d, --debug          Log the anchor listing of every container
//!   -v, --verbose        Debug-level logging
//!   -h, --help           Print help

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use anchorage::anchor::{lint, solver};
use anchorage::{convert_with_config, AnchorConfig, ConvertConfig, Snapshot};

/// Largest replay error, in pixels, that still counts as a match
const VERIFY_TOLERANCE: f64 = 1.0;

#[derive(Parser)]
#[command(name = "anchorage")]
#[command(about = "Turn measured box layouts into relative anchor constraints")]
struct Cli {
    /// Snapshot JSON file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Anchoring configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report structural problems in the result
    #[arg(long)]
    lint: bool,

    /// Replay the anchors in a constraint solver and report misplaced boxes
    #[arg(long)]
    verify: bool,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Debug mode: log the anchor listing of every container
    #[arg(short, long)]
    debug: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose || cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let anchors = match &cli.config {
        Some(path) => match AnchorConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => AnchorConfig::default(),
    };

    let loaded = match &cli.input {
        Some(path) => Snapshot::from_file(path),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                process::exit(1);
            }
            Snapshot::from_json(&buffer)
        }
    };
    let snapshot = match loaded {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let config = ConvertConfig::new().with_anchors(anchors).with_debug(cli.debug);
    let result = convert_with_config(&snapshot, &config);

    let json = if cli.compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            process::exit(1);
        }
    }

    let mut findings = 0;
    for skipped in &result.skipped {
        eprintln!("warning: {}", skipped);
    }
    if cli.lint {
        for warning in lint::check(&result) {
            eprintln!("lint: {}", warning);
            findings += 1;
        }
    }
    if cli.verify {
        match solver::verify(&snapshot, &result, VERIFY_TOLERANCE) {
            Ok(deviations) => {
                for deviation in &deviations {
                    eprintln!("verify: {}", deviation);
                }
                findings += deviations.len();
            }
            Err(e) => {
                eprintln!("verify: {}", e);
                findings += 1;
            }
        }
    }

    if findings > 0 {
        process::exit(2);
    }
}
