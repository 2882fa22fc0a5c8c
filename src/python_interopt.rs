//! Acts as the interface to rust code from python. Builds the nurse scheduling QUBO, so it can be handed to a
//! hardware sampler from python, and runs the classical reverse annealer on it.
use crate::errors::NurseError;
use crate::nurse::{NurseProblem, Penalties};
use crate::roster::Roster;
use crate::sampler::{ReverseAnnealer, SampleParams, Sampler};
use crate::schedule::AnnealSchedule;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

// type alias for the qubo data object passed to python: rows, cols, values, offset, number of variables
type QuboData = (Vec<usize>, Vec<usize>, Vec<f64>, f64, usize);

fn to_py_err(err: NurseError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn make_problem(nurses: usize, days: usize, penalties: Option<(f64, f64, f64)>) -> PyResult<NurseProblem> {
    let penalties = match penalties {
        Some((consecutive_days, hard_shift, soft_nurse)) => Penalties {
            consecutive_days,
            hard_shift,
            soft_nurse,
        },
        None => Penalties::default(),
    };
    NurseProblem::new(nurses, days, penalties).map_err(to_py_err)
}

/// Builds the nurse scheduling QUBO and returns it in coordinate form, upper triangular with the linear biases
/// on the diagonal.
///
/// Example
/// ``` python
/// import nurse_anneal
///
/// rows, cols, values, offset, num_x = nurse_anneal.build_nurse_qubo(3, 5)
/// Q = {(i, j): v for i, j, v in zip(rows, cols, values)}
/// ```
///
/// # Errors
///
/// Raises a ValueError if the problem has no nurses or no days.
#[pyfunction]
#[pyo3(signature = (nurses, days, penalties=None))]
pub fn build_nurse_qubo(nurses: usize, days: usize, penalties: Option<(f64, f64, f64)>) -> PyResult<QuboData> {
    let problem = make_problem(nurses, days, penalties)?;
    let coefficients = problem.build_hamiltonian();

    let mut rows = Vec::with_capacity(coefficients.len());
    let mut cols = Vec::with_capacity(coefficients.len());
    let mut values = Vec::with_capacity(coefficients.len());
    for (i, j, v) in coefficients.iter() {
        rows.push(i);
        cols.push(j);
        values.push(v);
    }

    Ok((rows, cols, values, problem.energy_offset(), problem.size()))
}

/// Reverse anneals the nurse scheduling QUBO from an initial state, returns the states and energies found,
/// lowest energy first. `penalties` is `(a, lambda, gamma)` as for `build_nurse_qubo`.
///
/// Example
/// ``` python
/// import nurse_anneal
///
/// x_0 = [1 if (i // 5) == (i % 5) % 3 else 0 for i in range(15)]
/// states, energies = nurse_anneal.reverse_anneal(3, 5, x_0, 100)
/// ```
///
/// # Errors
///
/// Raises a ValueError if the initial state does not fit the problem or the schedule is invalid.
#[allow(clippy::too_many_arguments)]
#[pyfunction]
#[pyo3(signature = (nurses, days, initial_state, num_reads, reinitialize_state=true, schedule=None, seed=0, penalties=None))]
pub fn reverse_anneal(
    nurses: usize,
    days: usize,
    initial_state: Vec<usize>,
    num_reads: usize,
    reinitialize_state: bool,
    schedule: Option<Vec<(f64, f64)>>,
    seed: u64,
    penalties: Option<(f64, f64, f64)>,
) -> PyResult<(Vec<Vec<usize>>, Vec<f64>)> {
    let problem = make_problem(nurses, days, penalties)?;
    let qubo = problem.to_qubo();

    let mut params = SampleParams::reverse(num_reads, initial_state, reinitialize_state).with_seed(seed);
    if let Some(points) = schedule {
        params.anneal_schedule = AnnealSchedule::new(points).map_err(to_py_err)?;
    }

    let samples = ReverseAnnealer::default()
        .sample(&qubo, &params)
        .map_err(to_py_err)?;

    Ok(samples.iter().map(|s| (s.state.clone(), s.energy)).unzip())
}

/// Checks a state against the hard constraints, returns the number of violations.
#[pyfunction]
pub fn hard_violations(nurses: usize, days: usize, state: Vec<usize>) -> PyResult<usize> {
    let problem = make_problem(nurses, days, None)?;
    let roster = Roster::from_sample(&problem, &state).map_err(to_py_err)?;
    Ok(roster.hard_violations())
}

#[pymodule]
fn nurse_anneal(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(build_nurse_qubo, m)?)?;
    m.add_function(wrap_pyfunction!(reverse_anneal, m)?)?;
    m.add_function(wrap_pyfunction!(hard_violations, m)?)?;
    Ok(())
}
