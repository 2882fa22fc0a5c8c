//! Error handling for problem construction, sampling, and result persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, NurseError>;

/// Errors that can occur while building, sampling, or storing a nurse scheduling run.
#[derive(Error, Debug)]
pub enum NurseError {
    /// The nurse scheduling problem itself is malformed.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The anneal schedule breaks one of the schedule rules.
    #[error("Invalid anneal schedule: {0}")]
    InvalidSchedule(String),

    /// The annealer settings cannot produce a usable temperature schedule.
    #[error("Invalid annealer settings: {0}")]
    InvalidAnnealer(String),

    /// The embedding does not fit the target graph or the problem.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// A state vector does not match the number of variables of the problem.
    #[error("State length mismatch: expected {expected}, found {found}")]
    StateLength { expected: usize, found: usize },

    /// A reverse schedule was requested without a state to start from.
    #[error("Reverse annealing requires an initial state")]
    MissingInitialState,

    /// The sample set is empty where a sample was required.
    #[error("Sample set is empty")]
    EmptySampleSet,

    /// The previous run this run is seeded from does not exist.
    #[error("No previous results at {}", .0.display())]
    MissingResults(PathBuf),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A results file could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),
}
