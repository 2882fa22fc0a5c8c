//! # Experiment driver
//!
//! Sweeps the `(nurses, days)` grid of an [`ExperimentConfig`]. A seed sweep forward anneals every problem on
//! the identity embedding and stores the results. A reverse sweep loads those results, re-uses their embedding
//! and target graph, and reverse anneals from their best raw sample.

use crate::coefficients::QuboCoefficients;
use crate::config::ExperimentConfig;
use crate::embedding::{Adjacency, Embedding};
use crate::errors::Result;
use crate::nurse::NurseProblem;
use crate::qubo::Qubo;
use crate::results::{results_path, RunKind, RunRecord, StoredBqm};
use crate::roster::Roster;
use crate::run_logger::{RunLogger, RunSummary};
use crate::sampler::{SampleParams, Sampler};
use crate::utils::calculate_hamming_distance;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Mean chain break fraction above which a run is flagged.
const CHAIN_BREAK_WARNING: f64 = 0.1;

pub struct Experiment<S: Sampler> {
    pub config: ExperimentConfig,
    pub sampler: S,
    logger: RunLogger,
}

impl<S: Sampler> Experiment<S> {
    pub fn new(config: ExperimentConfig, sampler: S) -> Self {
        let logger = RunLogger::new(config.verbose);
        Self {
            config,
            sampler,
            logger,
        }
    }

    pub fn problem(&self, nurses: usize, days: usize) -> Result<NurseProblem> {
        NurseProblem::new(nurses, days, self.config.penalties)
    }

    /// Forward anneals one problem on the identity embedding and stores the record.
    pub fn seed_run(&self, nurses: usize, days: usize) -> Result<(RunRecord, RunSummary)> {
        let start = Instant::now();
        let problem = self.problem(nurses, days)?;
        let coefficients = problem.build_hamiltonian();
        let embedding = Embedding::identity(problem.size());
        let adjacency = Adjacency::from_coefficients(&coefficients);

        let params = SampleParams::forward(self.config.num_reads, self.config.forward_duration)
            .with_seed(self.config.seed);

        let record = self.sample_embedded(problem, coefficients, embedding, adjacency, &params)?;
        let path = results_path(
            &self.config.results_dir,
            RunKind::Seed,
            self.config.topology,
            nurses,
            days,
            self.config.num_reads,
        );
        record.save(&path)?;

        let summary = self.summarize(&record, path, None, start)?;
        Ok((record, summary))
    }

    /// Reverse anneals one problem from the best raw sample of its seed run and stores the record.
    pub fn reverse_run(&self, nurses: usize, days: usize) -> Result<(RunRecord, RunSummary)> {
        let start = Instant::now();
        let previous_path = results_path(
            &self.config.results_dir,
            RunKind::Seed,
            self.config.topology,
            nurses,
            days,
            self.config.num_reads,
        );
        let previous = RunRecord::load(&previous_path)?;

        let problem = self.problem(nurses, days)?;
        if problem != previous.problem {
            warn!(
                path = %previous_path.display(),
                "stored problem differs from the configured one, using the configured problem"
            );
        }
        let coefficients = problem.build_hamiltonian();

        let initial_state = previous.initial_state()?.to_vec();
        let params = SampleParams {
            num_reads: self.config.num_reads,
            anneal_schedule: self.config.reverse_schedule.clone(),
            initial_state: Some(initial_state.clone()),
            reinitialize_state: self.config.reinitialize_state,
            seed: self.config.seed,
        };

        info!("Connected to {}. N = {}, D = {}", self.sampler.id(), nurses, days);
        let record = self.sample_embedded(problem, coefficients, previous.embedding, previous.adjacency, &params)?;

        let path = results_path(
            &self.config.results_dir,
            RunKind::reverse(self.config.reinitialize_state),
            self.config.topology,
            nurses,
            days,
            self.config.num_reads,
        );
        record.save(&path)?;

        let summary = self.summarize(&record, path, Some(initial_state.as_slice()), start)?;
        Ok((record, summary))
    }

    /// Embeds, samples, and unembeds one problem.
    fn sample_embedded(
        &self,
        problem: NurseProblem,
        coefficients: QuboCoefficients,
        embedding: Embedding,
        adjacency: Adjacency,
        params: &SampleParams,
    ) -> Result<RunRecord> {
        let offset = problem.energy_offset();
        let embedded = embedding.embed_qubo(&coefficients, &adjacency, self.config.chain_strength)?;
        let physical = Qubo::from_coefficients_with_size(&embedded, embedding.num_physical(), offset);

        let results = self.sampler.sample(&physical, params)?;
        let samples = embedding.unembed_sampleset(&results, &coefficients, offset)?;

        Ok(RunRecord {
            problem,
            topology: self.config.topology,
            results,
            embedding,
            adjacency,
            bqm: StoredBqm {
                coefficients,
                offset,
            },
            samples,
        })
    }

    fn summarize(
        &self,
        record: &RunRecord,
        path: PathBuf,
        initial_state: Option<&[usize]>,
        start: Instant,
    ) -> Result<RunSummary> {
        let best = record.samples.first()?;
        let moved_bits = match initial_state {
            Some(initial) => Some(calculate_hamming_distance(initial, &record.results.first()?.state)),
            None => None,
        };
        let roster = Roster::from_sample(&record.problem, &best.state)?;
        let chain_break_fraction = record.samples.mean_chain_break_fraction().unwrap_or(0.0);

        if chain_break_fraction > CHAIN_BREAK_WARNING {
            warn!(
                nurses = record.problem.nurses,
                days = record.problem.days,
                chain_break_fraction,
                "high chain break fraction, consider a larger chain strength"
            );
        }
        self.logger.output_roster(&roster);

        Ok(RunSummary {
            nurses: record.problem.nurses,
            days: record.problem.days,
            variables: record.problem.size(),
            physical_qubits: record.embedding.num_physical(),
            best_energy: best.energy,
            feasible: roster.is_feasible(),
            hard_violations: roster.hard_violations(),
            chain_break_fraction,
            moved_bits,
            elapsed_secs: start.elapsed().as_secs_f64(),
            path,
        })
    }

    fn sweep(
        &self,
        mode: &str,
        run: impl Fn(&Self, usize, usize) -> Result<(RunRecord, RunSummary)>,
    ) -> Result<Vec<RunSummary>> {
        self.config.validate()?;
        self.logger.output_header(&self.config, &self.sampler.id(), mode);

        let mut summaries = Vec::new();
        for (nurses, days) in self.config.grid() {
            let (_, summary) = run(self, nurses, days)?;
            self.logger.generate_output_line(&summary);
            summaries.push(summary);
        }

        self.logger.generate_exit_line(&summaries);
        Ok(summaries)
    }

    pub fn run_seed_sweep(&self) -> Result<Vec<RunSummary>> {
        self.sweep("seed", Self::seed_run)
    }

    pub fn run_reverse_sweep(&self) -> Result<Vec<RunSummary>> {
        self.sweep("reverse", Self::reverse_run)
    }
}
