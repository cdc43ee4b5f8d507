use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use epinet::manager::Manager;
use std::path::PathBuf;

/// Simulate SIRS contagion on agent networks.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Simulation directory holding `config.toml` and the run directories
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a network from the config and simulate a new run
    Create,

    /// Continue a run from its last checkpoint
    Resume {
        /// Index of the run directory
        #[arg(long)]
        run_idx: usize,
    },

    /// Summarize the trajectories of every run
    Analyze,

    /// Report the network effect of one vertex in a run's last checkpoint
    Probe {
        /// Index of the run directory
        #[arg(long)]
        run_idx: usize,

        /// Vertex to estimate the network effect of
        #[arg(long)]
        vertex: usize,
    },

    /// Remove every run directory
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create => mgr.create_run()?,
        Command::Resume { run_idx } => mgr.resume_run(run_idx)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Probe { run_idx, vertex } => mgr.probe_run(run_idx, vertex)?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
