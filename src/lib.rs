//! # nurse-anneal
//!
//! The nurse scheduling problem as a QUBO, solved by reverse annealing from the best solution of a previous run.
//!
//! - [`nurse`] builds the scheduling Hamiltonian as sparse [`coefficients`], and from there the matrix form [`qubo`]
//! - [`embedding`] spreads a logical QUBO over the chains of a stored minor embedding and resolves samples back
//! - [`sampler`] is the sampling seam, with a classical annealer driven by an anneal [`schedule`]
//! - [`results`] stores every run so the next one can start from it, [`experiment`] sweeps the problem sizes
//!
//! Example
//! ``` rust
//! use nurse_anneal::nurse::{NurseProblem, Penalties};
//! use nurse_anneal::roster::Roster;
//! use nurse_anneal::sampler::{ReverseAnnealer, SampleParams, Sampler};
//!
//! let problem = NurseProblem::new(3, 5, Penalties::default()).unwrap();
//! let qubo = problem.to_qubo();
//!
//! let samples = ReverseAnnealer::default()
//!     .sample(&qubo, &SampleParams::forward(10, 10.0))
//!     .unwrap();
//! let best = samples.first().unwrap();
//! let roster = Roster::from_sample(&problem, &best.state).unwrap();
//! println!("{roster}");
//! ```

pub mod coefficients;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod experiment;
pub mod initial_points;
pub mod local_search;
pub mod nurse;
pub mod qubo;
pub mod results;
pub mod roster;
pub mod run_logger;
pub mod sampler;
pub mod sampleset;
pub mod schedule;
pub mod utils;

#[cfg(feature = "python")]
mod python_interopt;
