//! qfract command-line interface
//!
//! Builds fractal circuits, runs them on the local simulator or a remote
//! backend, and prints histograms and Bloch vectors.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{Overrides, OutputFormat};
use commands::{backends, bloch, preset, run, version};

/// qfract - layered entangling circuits, simulated or on hardware
#[derive(Parser)]
#[command(name = "qfract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fractal experiment and print its report
    Run {
        /// Number of qubits
        #[arg(short, long)]
        qubits: Option<u32>,

        /// Number of rotation/entangling layers
        #[arg(short, long)]
        depth: Option<u32>,

        /// Number of shots
        #[arg(short, long)]
        shots: Option<u32>,

        /// Also attempt the remote backend, falling back to simulation
        #[arg(long)]
        real: bool,

        /// Remote backend name
        #[arg(short, long)]
        backend: Option<String>,

        /// Sampler seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Configuration file (defaults to ~/.qfract/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the Bloch vector of every qubit
    Bloch {
        /// Number of qubits
        #[arg(short, long, default_value = "4")]
        qubits: u32,

        /// Number of rotation/entangling layers
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run one of the built-in example circuits
    Preset {
        /// superposition, bell or teleportation
        name: String,

        /// Number of shots
        #[arg(short, long, default_value = "1024")]
        shots: u32,

        /// Sampler seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List remote backends
    Backends,

    /// Show version information
    Version,
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            qubits,
            depth,
            shots,
            real,
            backend,
            seed,
            format,
            config,
        } => {
            let overrides = Overrides {
                qubits,
                depth,
                shots,
                real,
                backend,
                seed,
            };
            run::execute(config.as_deref(), overrides, format).await
        }

        Commands::Bloch {
            qubits,
            depth,
            format,
        } => bloch::execute(qubits, depth, format),

        Commands::Preset { name, shots, seed } => preset::execute(&name, shots, seed).await,

        Commands::Backends => backends::execute().await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
