use crate::config::ExperimentConfig;
use crate::roster::Roster;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a single `(nurses, days)` run, one line of the sweep log.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub nurses: usize,
    pub days: usize,
    pub variables: usize,
    pub physical_qubits: usize,
    pub best_energy: f64,
    pub feasible: bool,
    pub hard_violations: usize,
    pub chain_break_fraction: f64,
    /// Bits the best raw sample differs from the initial state in, reverse runs only
    pub moved_bits: Option<usize>,
    pub elapsed_secs: f64,
    pub path: PathBuf,
}

/// This is the main logic behind the experiment output
///
/// It has varying levels of output, where 0 means nothing is displayed, and each
/// additional level includes everything previous
///
/// 0 - Nothing
/// 1 - Header, one line per run, and Finish
/// 2 - The best roster of each run
///
pub struct RunLogger {
    pub output_level: usize,
}

impl RunLogger {
    pub const fn new(level: usize) -> Self {
        Self {
            output_level: level,
        }
    }

    pub fn output_header(&self, config: &ExperimentConfig, sampler_id: &str, mode: &str) {
        if !self.shows(1) {
            return;
        }

        let version_number = env!("CARGO_PKG_VERSION");
        info!("nurse-anneal: Nurse Scheduling as a QUBO");
        info!("Version number {version_number}");
        info!("Mode: {mode}, sampler: {sampler_id}");
        info!(
            "Nurses {:?}, days {:?}, reads {}, topology {}",
            config.nurses, config.days, config.num_reads, config.topology
        );
        info!("------------------------------------------------------");
        info!("N | D | Variables | Qubits | Best Energy | Feasible | Chain Breaks | Moved Bits");
    }

    /// Whether output at `level` is displayed.
    pub const fn shows(&self, level: usize) -> bool {
        self.output_level >= level
    }

    pub fn generate_output_line(&self, summary: &RunSummary) {
        if !self.shows(1) {
            return;
        }

        info!("{}", Self::format_output_line(summary));
    }

    /// One row of the run table, `-` in the moved bits column for seed runs.
    pub fn format_output_line(summary: &RunSummary) -> String {
        let RunSummary {
            nurses,
            days,
            variables,
            physical_qubits,
            best_energy,
            feasible,
            chain_break_fraction,
            moved_bits,
            ..
        } = summary;
        let moved = moved_bits.map_or_else(|| "-".to_string(), |m| m.to_string());
        format!(
            "{nurses} | {days} | {variables} | {physical_qubits} | {best_energy:.4} | {feasible} | {chain_break_fraction:.3} | {moved}"
        )
    }

    pub fn output_roster(&self, roster: &Roster) {
        if !self.shows(2) {
            return;
        }

        info!("Best roster, {} hard violations\n{roster}", roster.hard_violations());
    }

    pub fn generate_exit_line(&self, summaries: &[RunSummary]) {
        if !self.shows(1) {
            return;
        }

        let feasible = summaries.iter().filter(|s| s.feasible).count();
        let time_passed: f64 = summaries.iter().map(|s| s.elapsed_secs).sum();
        info!("------------------------------------------------------");
        info!("Sweep Finished");
        info!("Runs: {}", summaries.len());
        info!("Feasible best samples: {feasible}");
        info!("Time to Solve: {time_passed:.3}s");
        info!("------------------------------------------------------");
    }
}
