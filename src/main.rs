//! nurse-anneal command line interface.
//!
//! `seed` forward anneals every problem of the sweep and stores the results, `reverse` reverse anneals each
//! problem from those results, `qubo` prints the QUBO of a single problem, and `inspect` shows the best roster
//! of a stored run.

use anyhow::Context;
use clap::{Parser, Subcommand};
use nurse_anneal::config::ExperimentConfig;
use nurse_anneal::experiment::Experiment;
use nurse_anneal::nurse::NurseProblem;
use nurse_anneal::results::{RunRecord, Topology};
use nurse_anneal::roster::Roster;
use nurse_anneal::sampler::ReverseAnnealer;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Nurse scheduling as a QUBO, solved by reverse annealing
#[derive(Parser)]
#[command(name = "nurse-anneal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML experiment configuration
    #[arg(short, long, global = true, env = "NURSE_ANNEAL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory results are read from and written to
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Number of reads per problem
    #[arg(long, global = true)]
    num_reads: Option<usize>,

    /// Seed of the annealer
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Target graph family used to label result files
    #[arg(long, global = true, value_enum)]
    topology: Option<Topology>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward anneal every problem of the sweep to produce initial states
    Seed,

    /// Reverse anneal every problem of the sweep from its seed results
    Reverse {
        /// Continue each read from the previous read instead of restarting from the initial state
        #[arg(long)]
        no_reinitialize: bool,
    },

    /// Print the QUBO of a single problem as JSON
    Qubo {
        #[arg(short, long)]
        nurses: usize,

        #[arg(short, long)]
        days: usize,
    },

    /// Show the best roster of a stored run
    Inspect {
        /// Results file
        path: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<ExperimentConfig> {
    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    if let Some(dir) = &cli.results_dir {
        config.results_dir = dir.clone();
    }
    if let Some(num_reads) = cli.num_reads {
        config.num_reads = num_reads;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(topology) = cli.topology {
        config.topology = topology;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Seed => {
            let annealer = ReverseAnnealer::new(config.annealer);
            let experiment = Experiment::new(config, annealer);
            experiment.run_seed_sweep()?;
        }
        Commands::Reverse { no_reinitialize } => {
            if no_reinitialize {
                config.reinitialize_state = false;
            }
            let annealer = ReverseAnnealer::new(config.annealer);
            let experiment = Experiment::new(config, annealer);
            experiment.run_reverse_sweep()?;
        }
        Commands::Qubo { nurses, days } => {
            let problem = NurseProblem::new(nurses, days, config.penalties)?;
            let output = serde_json::json!({
                "nurses": nurses,
                "days": days,
                "offset": problem.energy_offset(),
                "qubo": problem.build_hamiltonian(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Inspect { path } => {
            let record = RunRecord::load(&path)?;
            let best = record.samples.first()?;
            let roster = Roster::from_sample(&record.problem, &best.state)?;
            info!(
                "N = {}, D = {}, best energy {:.4}, {} distinct samples, sampler {}",
                record.problem.nurses,
                record.problem.days,
                best.energy,
                record.samples.len(),
                record.samples.info.sampler_id
            );
            println!("{roster}");
            println!(
                "feasible: {}, hard violations: {}",
                roster.is_feasible(),
                roster.hard_violations()
            );
        }
    }

    Ok(())
}
