//! # Sampling
//!
//! [`Sampler`] is the seam between the QUBO and whatever solves it. [`ReverseAnnealer`] is a classical stand in
//! for an annealing processor: a Metropolis annealer whose inverse temperature follows the anneal schedule, so a
//! reverse schedule that starts at `s = 1` starts frozen in the initial state, melts it partially while `s` is
//! lowered, and freezes it again on the way back up.

use crate::errors::{NurseError, Result};
use crate::initial_points::{checked_binary_point, generate_random_binary_point};
use crate::local_search::simple_local_search;
use crate::qubo::Qubo;
use crate::sampleset::{Sample, SampleSet, SamplerInfo};
use crate::schedule::AnnealSchedule;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smolprng::{Algorithm, JsfLarge, PRNG};
use std::time::Instant;
use tracing::debug;

/// Parameters of one sampling call.
#[derive(Clone, Debug)]
pub struct SampleParams {
    pub num_reads: usize,
    pub anneal_schedule: AnnealSchedule,
    /// Required by reverse schedules
    pub initial_state: Option<Vec<usize>>,
    /// Restart every read from the initial state instead of the previous read's final state
    pub reinitialize_state: bool,
    pub seed: u64,
}

impl SampleParams {
    pub fn reverse(num_reads: usize, initial_state: Vec<usize>, reinitialize_state: bool) -> Self {
        Self {
            num_reads,
            anneal_schedule: AnnealSchedule::reverse_default(),
            initial_state: Some(initial_state),
            reinitialize_state,
            seed: 0,
        }
    }

    pub fn forward(num_reads: usize, duration: f64) -> Self {
        Self {
            num_reads,
            anneal_schedule: AnnealSchedule::forward(duration),
            initial_state: None,
            reinitialize_state: true,
            seed: 0,
        }
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the parameters against the problem they will be used on and returns the initial state, if any.
    pub fn validate(&self, qubo: &Qubo) -> Result<Option<Array1<usize>>> {
        self.anneal_schedule.validate()?;
        if self.num_reads == 0 {
            return Err(NurseError::InvalidProblem("num_reads must be positive".to_string()));
        }
        match (&self.initial_state, self.anneal_schedule.is_reverse()) {
            (None, true) => Err(NurseError::MissingInitialState),
            (None, false) => Ok(None),
            (Some(state), _) => checked_binary_point(state, qubo.num_x()).map(Some),
        }
    }
}

pub trait Sampler {
    fn id(&self) -> String;

    fn sample(&self, qubo: &Qubo, params: &SampleParams) -> Result<SampleSet>;
}

/// Settings of the classical annealer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealerSettings {
    /// Metropolis sweeps per microsecond of schedule time
    pub sweeps_per_us: f64,
    /// Inverse temperature at s = 0
    pub beta_min: f64,
    /// Inverse temperature at s = 1
    pub beta_max: f64,
    /// Finish every read with a greedy single flip descent
    pub greedy_descent: bool,
}

impl Default for AnnealerSettings {
    fn default() -> Self {
        Self {
            sweeps_per_us: 50.0,
            beta_min: 0.1,
            beta_max: 50.0,
            greedy_descent: false,
        }
    }
}

impl AnnealerSettings {
    /// Inverse temperatures must be positive and ordered, and every value finite.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NurseError::InvalidAnnealer(msg));

        if !self.sweeps_per_us.is_finite() || self.sweeps_per_us <= 0.0 {
            return invalid(format!("sweeps_per_us must be positive, got {}", self.sweeps_per_us));
        }
        if !self.beta_min.is_finite() || self.beta_min <= 0.0 {
            return invalid(format!("beta_min must be positive, got {}", self.beta_min));
        }
        if !self.beta_max.is_finite() || self.beta_max < self.beta_min {
            return invalid(format!(
                "beta_max must be at least beta_min = {}, got {}",
                self.beta_min, self.beta_max
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReverseAnnealer {
    pub settings: AnnealerSettings,
}

impl ReverseAnnealer {
    pub const fn new(settings: AnnealerSettings) -> Self {
        Self { settings }
    }

    /// Geometric interpolation between the two inverse temperatures.
    pub fn beta(&self, s: f64) -> f64 {
        let AnnealerSettings { beta_min, beta_max, .. } = self.settings;
        beta_min * (beta_max / beta_min).powf(s.clamp(0.0, 1.0))
    }

    /// Inverse temperature of each sweep, sampled at the middle of the sweep.
    pub fn beta_schedule(&self, schedule: &AnnealSchedule) -> Vec<f64> {
        let duration = schedule.duration();
        let sweeps = ((duration * self.settings.sweeps_per_us).round() as usize).max(1);
        let dt = duration / sweeps as f64;
        (0..sweeps)
            .map(|k| self.beta(schedule.s_at((k as f64 + 0.5) * dt)))
            .collect()
    }

    /// Runs one read from `state`, in place.
    fn anneal_read<T: Algorithm>(
        &self,
        qubo: &Qubo,
        linear: &Array1<f64>,
        neighbors: &[Vec<(usize, f64)>],
        betas: &[f64],
        state: &mut Array1<usize>,
        prng: &mut PRNG<T>,
    ) {
        let n = state.len();

        // energy change from flipping each bit, kept current as bits flip
        let mut deltas = Array1::<f64>::zeros(n);
        for i in 0..n {
            let mut field = linear[i];
            for &(j, w) in &neighbors[i] {
                field += w * state[j] as f64;
            }
            deltas[i] = if state[i] == 1 { -field } else { field };
        }

        for &beta in betas {
            for i in 0..n {
                let delta = deltas[i];
                if delta > 0.0 && (-beta * delta).exp() <= prng.gen_f64() {
                    continue;
                }

                state[i] = 1 - state[i];
                deltas[i] = -delta;
                let now_on = state[i] == 1;
                for &(j, w) in &neighbors[i] {
                    // the field on j moved by +-w, its flip direction decides the sign
                    let shift = if now_on { w } else { -w };
                    if state[j] == 1 {
                        deltas[j] -= shift;
                    } else {
                        deltas[j] += shift;
                    }
                }
            }
        }

        if self.settings.greedy_descent {
            *state = simple_local_search(qubo, state, usize::MAX);
        }
    }
}

impl Sampler for ReverseAnnealer {
    fn id(&self) -> String {
        format!("simulated-reverse-annealer-{}", env!("CARGO_PKG_VERSION"))
    }

    fn sample(&self, qubo: &Qubo, params: &SampleParams) -> Result<SampleSet> {
        self.settings.validate()?;
        let initial = params.validate(qubo)?;
        let start = Instant::now();
        let n = qubo.num_x();

        let linear = qubo.linear_terms();
        let neighbors = qubo.neighbors();
        let betas = self.beta_schedule(&params.anneal_schedule);
        debug!(sweeps = betas.len(), variables = n, "annealing");

        let make_prng = |read: usize| PRNG {
            generator: JsfLarge::from(params.seed.wrapping_add(read as u64)),
        };
        let start_state = |prng: &mut PRNG<JsfLarge>| match &initial {
            Some(x) => x.clone(),
            None => generate_random_binary_point(n, prng, 0.5),
        };

        let states: Vec<Array1<usize>> = if params.reinitialize_state {
            (0..params.num_reads)
                .into_par_iter()
                .map(|read| {
                    let mut prng = make_prng(read);
                    let mut state = start_state(&mut prng);
                    self.anneal_read(qubo, &linear, &neighbors, &betas, &mut state, &mut prng);
                    state
                })
                .collect()
        } else {
            // each read continues from where the previous one ended
            let mut prng = make_prng(0);
            let mut state = start_state(&mut prng);
            let mut states = Vec::with_capacity(params.num_reads);
            for _ in 0..params.num_reads {
                self.anneal_read(qubo, &linear, &neighbors, &betas, &mut state, &mut prng);
                states.push(state.clone());
            }
            states
        };

        let samples = states
            .into_iter()
            .map(|state| Sample {
                energy: qubo.eval_usize(&state),
                state: state.to_vec(),
                num_occurrences: 1,
                chain_break_fraction: None,
            })
            .collect();

        let info = SamplerInfo {
            sampler_id: self.id(),
            num_reads: params.num_reads,
            schedule: Some(params.anneal_schedule.clone()),
            reinitialize_state: params.reinitialize_state,
            seed: params.seed,
            sampling_time_ms: start.elapsed().as_secs_f64() * 1e3,
        };

        Ok(SampleSet::from_samples(samples, info))
    }
}
