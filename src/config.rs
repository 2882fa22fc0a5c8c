//! Experiment configuration, read from YAML. Every field is optional and defaults to the values of the reference
//! experiment: 3 to 4 nurses over 5 to 14 days, 1000 reads of the default reverse schedule.

use crate::errors::{NurseError, Result};
use crate::nurse::Penalties;
use crate::results::Topology;
use crate::sampler::AnnealerSettings;
use crate::schedule::AnnealSchedule;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Half open range of nurse counts
    pub nurses: Range<usize>,
    /// Half open range of day counts
    pub days: Range<usize>,
    pub num_reads: usize,
    pub reverse_schedule: AnnealSchedule,
    pub reinitialize_state: bool,
    /// Length in microseconds of the forward anneal used by seed runs
    pub forward_duration: f64,
    pub topology: Topology,
    pub penalties: Penalties,
    pub chain_strength: f64,
    pub results_dir: PathBuf,
    pub seed: u64,
    pub annealer: AnnealerSettings,
    /// Output level of the run logger, 0 silences it
    pub verbose: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            nurses: 3..5,
            days: 5..15,
            num_reads: 1000,
            reverse_schedule: AnnealSchedule::reverse_default(),
            reinitialize_state: true,
            forward_duration: 20.0,
            topology: Topology::Pegasus,
            penalties: Penalties::default(),
            chain_strength: 1.0,
            results_dir: PathBuf::from("."),
            seed: 0,
            annealer: AnnealerSettings::default(),
            verbose: 1,
        }
    }
}

impl ExperimentConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nurses.is_empty() || self.nurses.start == 0 {
            return Err(NurseError::InvalidProblem(format!(
                "nurse range {:?} must be non-empty and start above 0",
                self.nurses
            )));
        }
        if self.days.is_empty() || self.days.start == 0 {
            return Err(NurseError::InvalidProblem(format!(
                "day range {:?} must be non-empty and start above 0",
                self.days
            )));
        }
        if self.num_reads == 0 {
            return Err(NurseError::InvalidProblem("num_reads must be positive".to_string()));
        }
        if self.chain_strength <= 0.0 {
            return Err(NurseError::InvalidEmbedding(format!(
                "chain strength must be positive, got {}",
                self.chain_strength
            )));
        }
        if !self.reverse_schedule.is_reverse() {
            return Err(NurseError::InvalidSchedule(
                "reverse schedule must start at s = 1".to_string(),
            ));
        }
        self.reverse_schedule.validate()?;
        self.annealer.validate()?;
        AnnealSchedule::new(vec![(0.0, 0.0), (self.forward_duration, 1.0)])?;
        Ok(())
    }

    /// Every `(nurses, days)` pair of the sweep, nurses outermost.
    pub fn grid(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nurses
            .clone()
            .flat_map(move |n| self.days.clone().map(move |d| (n, d)))
    }
}
