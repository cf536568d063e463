//! schemtrace CLI
//!
//! Turn detector output into an LTspice schematic.
//!
//! # Usage
//!
//! ```bash
//! # Convert detections to .asc (writes detections.asc next to the input)
//! schemtrace convert detections.json
//!
//! # Custom thresholds and a graph dump for debugging
//! schemtrace convert detections.json -o out.asc -c schemtrace.yaml --dump-graph graph.json
//!
//! # Show the normalized node table
//! schemtrace inspect detections.json
//!
//! # Deduplicate raw Hough lines before classification
//! schemtrace prune-lines hough.json -o lines.json
//!
//! # Write the default configuration
//! schemtrace init-config
//! ```

mod cli;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemtrace")]
#[command(about = "Assemble detected schematic lines into an LTspice .asc file")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write an .asc schematic
    Convert {
        /// Detections JSON (lines, classifications, optional OCR and scale)
        input: PathBuf,

        /// Output .asc path (defaults to the input path with .asc extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threshold configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Resolution factor, overriding the one in the detections file
        #[arg(long)]
        scale: Option<f64>,

        /// Also write the normalized graph as JSON
        #[arg(long)]
        dump_graph: Option<PathBuf>,
    },

    /// Print the normalized node table without writing anything
    Inspect {
        /// Detections JSON
        input: PathBuf,

        /// Threshold configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Resolution factor, overriding the one in the detections file
        #[arg(long)]
        scale: Option<f64>,
    },

    /// Remove near-identical lines from a raw [[x1,y1,x2,y2],...] list
    PruneLines {
        /// Line list JSON
        input: PathBuf,

        /// Output JSON path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threshold configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default threshold configuration
    InitConfig {
        /// Destination path
        #[arg(default_value = "schemtrace.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Convert {
            input,
            output,
            config,
            scale,
            dump_graph,
        } => cli::convert::run(
            input,
            output.as_deref(),
            config.as_deref(),
            *scale,
            dump_graph.as_deref(),
        ),
        Commands::Inspect {
            input,
            config,
            scale,
        } => cli::inspect::run(input, config.as_deref(), *scale),
        Commands::PruneLines {
            input,
            output,
            config,
        } => cli::prune::run(input, output.as_deref(), config.as_deref()),
        Commands::InitConfig { path, force } => cli::init::run(path, *force),
    }
}
