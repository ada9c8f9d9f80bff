//! Strata CLI: run, inspect, and validate simulations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about = "Strata: parallel material point method engine")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a config file.
    Run {
        /// Path to simulation config (TOML).
        #[arg(short, long, default_value = "simulation.toml")]
        config: PathBuf,

        /// Override the configured worker count.
        #[arg(short, long)]
        workers: Option<usize>,

        /// Resume from the latest checkpoint.
        #[arg(long)]
        resume: bool,
    },

    /// Print the contents of a checkpoint file.
    Inspect {
        /// Path to checkpoint file.
        path: PathBuf,
    },

    /// Validate a simulation config without running it.
    Validate {
        /// Path to config file.
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Run {
            config,
            workers,
            resume,
        } => commands::run(&config, workers, resume),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
