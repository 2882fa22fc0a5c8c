//! Decodes a sampled state into a nurse by day roster and reports which constraints it violates.

use crate::errors::{NurseError, Result};
use crate::nurse::NurseProblem;
use ndarray::Array2;
use serde::Serialize;
use std::fmt;

/// Tolerance for treating a coverage deviation as zero.
const COVERAGE_TOL: f64 = 1e-9;

#[derive(Clone, Debug, Serialize)]
pub struct Roster {
    /// `on_duty[[n, d]]` is true when nurse n works day d
    pub on_duty: Array2<bool>,
    /// `(nurse, day)` pairs where the nurse also works on `day + 1`
    pub consecutive: Vec<(usize, usize)>,
    /// `sum_n E(n) q(n, d) - W(d)` for each day
    pub coverage_deviation: Vec<f64>,
    /// `sum_d G(n, d) q(n, d) - F(n)` for each nurse
    pub duty_deviation: Vec<f64>,
}

impl Roster {
    pub fn from_sample(problem: &NurseProblem, state: &[usize]) -> Result<Self> {
        if state.len() != problem.size() {
            return Err(NurseError::StateLength {
                expected: problem.size(),
                found: state.len(),
            });
        }

        let on_duty = Array2::from_shape_fn((problem.nurses, problem.days), |(n, d)| {
            state[problem.index(n, d)] == 1
        });

        let mut consecutive = Vec::new();
        for n in 0..problem.nurses {
            for d in 0..problem.days.saturating_sub(1) {
                if on_duty[[n, d]] && on_duty[[n, d + 1]] {
                    consecutive.push((n, d));
                }
            }
        }

        let coverage_deviation = (0..problem.days)
            .map(|d| {
                let cover: f64 = (0..problem.nurses)
                    .filter(|&n| on_duty[[n, d]])
                    .map(|n| problem.effort[n])
                    .sum();
                cover - problem.workforce[d]
            })
            .collect();

        let duty_days = problem.duty_days() as f64;
        let duty_deviation = (0..problem.nurses)
            .map(|n| {
                let worked: f64 = (0..problem.days)
                    .filter(|&d| on_duty[[n, d]])
                    .map(|d| problem.preference[[n, d]])
                    .sum();
                worked - duty_days
            })
            .collect();

        Ok(Self {
            on_duty,
            consecutive,
            coverage_deviation,
            duty_deviation,
        })
    }

    /// No nurse works consecutive days and every day has exactly the workforce it needs.
    pub fn is_feasible(&self) -> bool {
        self.consecutive.is_empty() && self.coverage_deviation.iter().all(|c| c.abs() < COVERAGE_TOL)
    }

    /// Number of hard constraint violations, counting each consecutive pair and each mis-covered day once.
    pub fn hard_violations(&self) -> usize {
        self.consecutive.len()
            + self
                .coverage_deviation
                .iter()
                .filter(|c| c.abs() >= COVERAGE_TOL)
                .count()
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nurses, days) = self.on_duty.dim();
        write!(f, "     ")?;
        for d in 0..days {
            write!(f, "{:>3}", d)?;
        }
        writeln!(f)?;
        for n in 0..nurses {
            write!(f, "N{:<3} ", n)?;
            for d in 0..days {
                let mark = if self.on_duty[[n, d]] { '#' } else { '.' };
                write!(f, "{:>3}", mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
