//! Sample sets returned by a sampler: distinct states with their energies and occurrence counts, lowest energy
//! first.

use crate::errors::{NurseError, Result};
use crate::schedule::AnnealSchedule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub state: Vec<usize>,
    pub energy: f64,
    pub num_occurrences: usize,
    /// Fraction of broken chains, only present on unembedded samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_break_fraction: Option<f64>,
}

/// Bookkeeping about how a sample set was produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplerInfo {
    pub sampler_id: String,
    pub num_reads: usize,
    pub schedule: Option<AnnealSchedule>,
    pub reinitialize_state: bool,
    pub seed: u64,
    pub sampling_time_ms: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
    pub info: SamplerInfo,
}

impl SampleSet {
    /// Aggregates identical states and sorts by ascending energy. States are compared exactly, chain break
    /// fractions of merged samples are averaged by occurrence.
    pub fn from_samples(samples: Vec<Sample>, info: SamplerInfo) -> Self {
        let mut positions: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut merged: Vec<Sample> = Vec::new();

        for sample in samples {
            match positions.get(&sample.state) {
                Some(&k) => {
                    let existing = &mut merged[k];
                    let total = existing.num_occurrences + sample.num_occurrences;
                    existing.chain_break_fraction = match (existing.chain_break_fraction, sample.chain_break_fraction) {
                        (Some(a), Some(b)) => Some(
                            (a * existing.num_occurrences as f64 + b * sample.num_occurrences as f64) / total as f64,
                        ),
                        (a, b) => a.or(b),
                    };
                    existing.num_occurrences = total;
                }
                None => {
                    positions.insert(sample.state.clone(), merged.len());
                    merged.push(sample);
                }
            }
        }

        merged.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        Self { samples: merged, info }
    }

    /// The lowest energy sample.
    pub fn first(&self) -> Result<&Sample> {
        self.samples.first().ok_or(NurseError::EmptySampleSet)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Total number of reads represented, counting repeated states.
    pub fn total_occurrences(&self) -> usize {
        self.samples.iter().map(|s| s.num_occurrences).sum()
    }

    /// Occurrence weighted mean chain break fraction, `None` for sample sets that were never unembedded.
    pub fn mean_chain_break_fraction(&self) -> Option<f64> {
        let mut weighted = 0.0;
        let mut count = 0;
        for sample in &self.samples {
            if let Some(fraction) = sample.chain_break_fraction {
                weighted += fraction * sample.num_occurrences as f64;
                count += sample.num_occurrences;
            }
        }
        (count > 0).then(|| weighted / count as f64)
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
