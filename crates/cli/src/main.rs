//! Write-prediction trace replay CLI.
//!
//! This binary replays a store trace through the prediction engine. It performs:
//! 1. **Setup:** Loads an optional JSON configuration and installs the log subscriber.
//! 2. **Replay:** Applies each write to a sparse memory and sends it through the port.
//! 3. **Report:** Prints the statistics report, or the counters as JSON.

use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wpred_core::stats::STATS_SECTIONS;
use wpred_core::trace::read_trace;
use wpred_core::{Config, PredictionEngine, PredictorPort, PredictorStats, SparseMemory};

#[derive(Parser, Debug)]
#[command(
    name = "wpred",
    author,
    version,
    about = "Speculative write-prediction engine",
    long_about = "Replay a store trace through the write-prediction engine and report how many write-backs were predicted.\n\nExamples:\n  wpred run --trace stores.trace\n  wpred run --trace stores.trace --config wpred.json --stats backend,metadata\n  RUST_LOG=wpred::matcher=debug wpred run --trace stores.trace --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print the statistics.
    Run {
        /// Trace file (`@pc P|V W|C addr size data tick` per line).
        #[arg(short, long)]
        trace: String,

        /// JSON configuration; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Print the counters as JSON instead of the report.
        #[arg(long)]
        json: bool,

        /// Comma-separated report sections to print.
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trace,
            config,
            json,
            stats,
        } => cmd_run(&trace, config.as_deref(), json, &stats),
    }
}

/// Replays `trace_path` and prints the statistics.
///
/// Exits with code 1 if the configuration or trace cannot be loaded.
fn cmd_run(trace_path: &str, config_path: Option<&str>, json: bool, sections: &[String]) {
    if let Some(bad) = sections
        .iter()
        .find(|s| !STATS_SECTIONS.contains(&s.as_str()))
    {
        eprintln!(
            "Error: unknown stats section `{bad}` (expected one of {})",
            STATS_SECTIONS.join(", ")
        );
        process::exit(1);
    }

    let config = match config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading config {path}: {e}");
            process::exit(1);
        }),
        None => Config::default(),
    };
    let engine = PredictionEngine::try_new(config).unwrap_or_else(|e| {
        eprintln!("Error: invalid config: {e}");
        process::exit(1);
    });
    let records = read_trace(trace_path).unwrap_or_else(|e| {
        eprintln!("Error reading trace {trace_path}: {e}");
        process::exit(1);
    });
    info!(records = records.len(), trace = trace_path, "replaying trace");

    let stats = replay(engine, &records);
    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error encoding statistics: {e}");
                process::exit(1);
            }
        }
    } else {
        stats.print_sections(sections);
    }
}

/// Sends every record through a port, servicing it whenever it is busy.
fn replay(engine: PredictionEngine, records: &[wpred_core::trace::TraceRecord]) -> PredictorStats {
    let mut memory = SparseMemory::new();
    let mut port = PredictorPort::new(engine);
    let mut mislabelled = 0u64;

    for record in records {
        if record.persistent != port.engine().config().region.contains(record.addr) {
            mislabelled += 1;
        }
        let op = record.to_store_op();
        memory.apply(&op);
        let mut pending = Some(op);
        while let Some(op) = pending.take() {
            if let Err(busy) = port.try_send(op.clone()) {
                debug!(%busy, "port busy, servicing");
                let _ = port.service(&mut memory);
                while port.try_recv().is_some() {}
                pending = Some(op);
            }
        }
    }
    let _ = port.service(&mut memory);
    while port.try_recv().is_some() {}

    if mislabelled > 0 {
        info!(mislabelled, "records whose region tag disagrees with the configured region");
    }
    port.stats()
}
