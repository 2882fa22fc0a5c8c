//! Persistence of run results.
//!
//! Each run is stored as one JSON file holding the raw (physical) sample set, the embedding and target graph it
//! was sampled on, the logical QUBO, and the unembedded samples. A reverse run reads the record of an earlier run
//! to re-use its embedding and start from its best raw sample.

use crate::coefficients::QuboCoefficients;
use crate::embedding::{Adjacency, Embedding};
use crate::errors::{NurseError, Result};
use crate::nurse::NurseProblem;
use crate::sampleset::SampleSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Target graph family, used to label result files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Chimera,
    #[default]
    Pegasus,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chimera => f.write_str("chimera"),
            Self::Pegasus => f.write_str("pegasus"),
        }
    }
}

/// The kind of run a results file belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    /// Forward anneal that produces the embedding and initial states
    Seed,
    /// Reverse anneal restarting every read from the initial state
    ReinitializedReverse,
    /// Reverse anneal continuing each read from the previous one
    Reverse,
}

impl RunKind {
    pub const fn reverse(reinitialize_state: bool) -> Self {
        if reinitialize_state {
            Self::ReinitializedReverse
        } else {
            Self::Reverse
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Seed => "results",
            Self::ReinitializedReverse => "reinitialized_reverse_results",
            Self::Reverse => "reverse_results",
        }
    }
}

/// `{prefix}_{topology}_N{nurses}_D{days}_s{reads}.json`
pub fn results_file_name(kind: RunKind, topology: Topology, nurses: usize, days: usize, num_reads: usize) -> String {
    format!(
        "{}_{}_N{}_D{}_s{}.json",
        kind.prefix(),
        topology,
        nurses,
        days,
        num_reads
    )
}

pub fn results_path(
    dir: &Path,
    kind: RunKind,
    topology: Topology,
    nurses: usize,
    days: usize,
    num_reads: usize,
) -> PathBuf {
    dir.join(results_file_name(kind, topology, nurses, days, num_reads))
}

/// The logical model that was sampled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredBqm {
    pub coefficients: QuboCoefficients,
    pub offset: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub problem: NurseProblem,
    pub topology: Topology,
    /// Samples over physical qubits, as returned by the sampler
    pub results: SampleSet,
    pub embedding: Embedding,
    pub adjacency: Adjacency,
    pub bqm: StoredBqm,
    /// Samples over logical variables, after unembedding
    pub samples: SampleSet,
}

impl RunRecord {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NurseError::MissingResults(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let record: Self = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), samples = record.samples.len(), "loaded results");
        Ok(record)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        debug!(path = %path.display(), "saved results");
        Ok(())
    }

    /// The lowest energy raw sample, the state a reverse anneal starts from.
    pub fn initial_state(&self) -> Result<&[usize]> {
        Ok(&self.results.first()?.state)
    }
}
