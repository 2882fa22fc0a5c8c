//! # Nurse scheduling Hamiltonian
//!
//! Binary variable `q(n, d)` is 1 when nurse `n` works on day `d`, stored at index `n * days + d`. The target
//! Hamiltonian is
//!
//! $$H(q) = \sum_{n,n'} \sum_{d,d'} J_{(n,d)(n',d')} q_i q_j + \lambda \sum_d \[\sum_n E(n) q_i - W(d)\]^2
//!        + \gamma \sum_n \[\sum_d G(n,d) q_i - F(n)\]^2$$
//!
//! where `J = a` for the same nurse on consecutive days, `E` is the effort of a nurse, `W` the workforce a day
//! needs, `G` the preference of a nurse for a day, and `F` the number of duty days each nurse should work.
//!
//! Reference: Ikeda, Nakamura, Humble, "Application of quantum annealing to nurse scheduling problem",
//! Scientific Reports 9, 12837 (2019).

use crate::coefficients::QuboCoefficients;
use crate::errors::{NurseError, Result};
use crate::qubo::Qubo;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Penalty weights of the three constraint families.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties {
    /// `a`, the hard nurse constraint: no nurse on consecutive days
    pub consecutive_days: f64,
    /// `lambda`, the hard shift constraint: enough effort on each day to cover the workforce
    pub hard_shift: f64,
    /// `gamma`, the soft nurse constraint: each nurse's preferences and fair share of duty days
    pub soft_nurse: f64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            consecutive_days: 7.0 / 2.0,
            hard_shift: 1.3,
            soft_nurse: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NurseProblem {
    pub nurses: usize,
    pub days: usize,
    pub penalties: Penalties,
    /// E(n)
    pub effort: Array1<f64>,
    /// W(d)
    pub workforce: Array1<f64>,
    /// G(n, d)
    pub preference: Array2<f64>,
}

impl NurseProblem {
    /// Creates a problem with unit effort, workforce, and preference.
    pub fn new(nurses: usize, days: usize, penalties: Penalties) -> Result<Self> {
        Self::with_profiles(
            nurses,
            days,
            penalties,
            Array1::ones(nurses),
            Array1::ones(days),
            Array2::ones((nurses, days)),
        )
    }

    pub fn with_profiles(
        nurses: usize,
        days: usize,
        penalties: Penalties,
        effort: Array1<f64>,
        workforce: Array1<f64>,
        preference: Array2<f64>,
    ) -> Result<Self> {
        let problem = Self {
            nurses,
            days,
            penalties,
            effort,
            workforce,
            preference,
        };
        problem.validate()?;
        Ok(problem)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nurses == 0 || self.days == 0 {
            return Err(NurseError::InvalidProblem(format!(
                "need at least one nurse and one day, got N = {}, D = {}",
                self.nurses, self.days
            )));
        }
        if self.effort.len() != self.nurses {
            return Err(NurseError::InvalidProblem(format!(
                "effort has {} entries for {} nurses",
                self.effort.len(),
                self.nurses
            )));
        }
        if self.workforce.len() != self.days {
            return Err(NurseError::InvalidProblem(format!(
                "workforce has {} entries for {} days",
                self.workforce.len(),
                self.days
            )));
        }
        if self.preference.dim() != (self.nurses, self.days) {
            let (rows, cols) = self.preference.dim();
            return Err(NurseError::InvalidProblem(format!(
                "preference is {rows}x{cols}, expected {}x{}",
                self.nurses, self.days
            )));
        }
        Ok(())
    }

    /// Number of binary variables.
    pub const fn size(&self) -> usize {
        self.nurses * self.days
    }

    pub const fn index(&self, nurse: usize, day: usize) -> usize {
        nurse * self.days + day
    }

    /// Inverse of [`NurseProblem::index`], returns `(nurse, day)`.
    pub const fn position(&self, index: usize) -> (usize, usize) {
        (index / self.days, index % self.days)
    }

    /// F(n), the evenly distributed number of duty days per nurse.
    pub const fn duty_days(&self) -> usize {
        self.days / self.nurses
    }

    /// Builds the sparse coefficient form of the Hamiltonian.
    pub fn build_hamiltonian(&self) -> QuboCoefficients {
        let mut q = QuboCoefficients::new();
        let a = self.penalties.consecutive_days;
        let lambda = self.penalties.hard_shift;
        let gamma = self.penalties.soft_nurse;
        let duty_days = self.duty_days() as f64;

        // hard nurse constraint, J = a delta(n, n') delta(d', d + 1)
        for nurse in 0..self.nurses {
            for day in 0..self.days.saturating_sub(1) {
                q.set(self.index(nurse, day), self.index(nurse, day + 1), a);
            }
        }

        // hard shift constraint
        for day in 0..self.days {
            let w = self.workforce[day];
            for nurse in 0..self.nurses {
                let e = self.effort[nurse];
                let idx = self.index(nurse, day);
                q.add(idx, idx, lambda * e * (e - 2.0 * w));
                for partner in nurse + 1..self.nurses {
                    q.add(idx, self.index(partner, day), 2.0 * lambda * e * self.effort[partner]);
                }
            }
        }

        // soft nurse constraint
        for nurse in 0..self.nurses {
            for day in 0..self.days {
                let g = self.preference[[nurse, day]];
                let idx = self.index(nurse, day);
                q.add(idx, idx, gamma * g * (g - 2.0 * duty_days));
                for day2 in day + 1..self.days {
                    q.add(idx, self.index(nurse, day2), 2.0 * gamma * g * self.preference[[nurse, day2]]);
                }
            }
        }

        q
    }

    /// Constant part of the expanded squares, so that a perfect schedule has zero energy.
    pub fn energy_offset(&self) -> f64 {
        let duty_days = self.duty_days() as f64;
        let shift: f64 = self.workforce.iter().map(|w| w * w).sum();
        self.penalties.hard_shift * shift + self.penalties.soft_nurse * self.nurses as f64 * duty_days * duty_days
    }

    pub fn to_qubo(&self) -> Qubo {
        self.build_hamiltonian().to_qubo(self.energy_offset())
    }

    /// Evaluates the Hamiltonian directly from its three terms, without building the QUBO.
    pub fn hamiltonian(&self, state: &[usize]) -> Result<f64> {
        if state.len() != self.size() {
            return Err(NurseError::StateLength {
                expected: self.size(),
                found: state.len(),
            });
        }
        let bit = |n: usize, d: usize| state[self.index(n, d)] as f64;
        let duty_days = self.duty_days() as f64;

        let mut consecutive = 0.0;
        for n in 0..self.nurses {
            for d in 0..self.days.saturating_sub(1) {
                consecutive += bit(n, d) * bit(n, d + 1);
            }
        }

        let mut shift = 0.0;
        for d in 0..self.days {
            let cover: f64 = (0..self.nurses).map(|n| self.effort[n] * bit(n, d)).sum();
            shift += (cover - self.workforce[d]).powi(2);
        }

        let mut soft = 0.0;
        for n in 0..self.nurses {
            let worked: f64 = (0..self.days).map(|d| self.preference[[n, d]] * bit(n, d)).sum();
            soft += (worked - duty_days).powi(2);
        }

        Ok(self.penalties.consecutive_days * consecutive
            + self.penalties.hard_shift * shift
            + self.penalties.soft_nurse * soft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn problem(nurses: usize, days: usize) -> NurseProblem {
        NurseProblem::new(nurses, days, Penalties::default()).unwrap()
    }

    #[test]
    fn index_round_trips_position() {
        let p = problem(3, 5);
        assert_eq!(p.size(), 15);
        assert_eq!(p.index(2, 4), 14);
        assert_eq!(p.position(7), (1, 2));
        assert_eq!(p.duty_days(), 1);
    }

    #[test]
    fn consecutive_day_coupling() {
        let p = problem(3, 5);
        let q = p.build_hamiltonian();

        // a plus the soft nurse coupling 2 gamma G G for the same nurse
        let expected = 3.5 + 2.0 * 0.3;
        assert!((q.get(p.index(0, 0), p.index(0, 1)) - expected).abs() < 1e-12);

        // no wrap around from the last day of one nurse to the first of the next
        assert!(!q.contains(p.index(0, 4), p.index(1, 0)));
    }

    #[test]
    fn diagonal_and_partner_terms() {
        let p = problem(3, 5);
        let q = p.build_hamiltonian();

        // lambda E (E - 2W) + gamma G (G - 2F) with unit profiles and F = 1
        let diag = 1.3 * (1.0 - 2.0) + 0.3 * (1.0 - 2.0);
        assert!((q.get(0, 0) - diag).abs() < 1e-12);

        // two nurses on the same day
        assert!((q.get(p.index(0, 2), p.index(2, 2)) - 2.0 * 1.3).abs() < 1e-12);

        // same nurse, non consecutive days
        assert!((q.get(p.index(1, 0), p.index(1, 3)) - 2.0 * 0.3).abs() < 1e-12);
    }

    #[test]
    fn offset_matches_constant_workforce_formula() {
        let p = problem(4, 14);
        let expected = 1.3 * 14.0 + 0.3 * 4.0 * 9.0;
        assert!((p.energy_offset() - expected).abs() < 1e-12);
    }

    #[test]
    fn qubo_energy_equals_hamiltonian() {
        let p = problem(3, 7);
        let qubo = p.to_qubo();
        let states = [
            vec![0; 21],
            vec![1; 21],
            (0..21).map(|i| i % 2).collect::<Vec<_>>(),
            (0..21).map(|i| usize::from(i % 3 == 0)).collect::<Vec<_>>(),
        ];

        for state in states {
            let direct = p.hamiltonian(&state).unwrap();
            let via_qubo = qubo.eval_usize(&Array1::from_vec(state));
            assert!((direct - via_qubo).abs() < 1e-9);
        }
    }

    #[test]
    fn non_uniform_profiles_match_hamiltonian() {
        let p = NurseProblem::with_profiles(
            3,
            4,
            Penalties::default(),
            Array1::from_vec(vec![1.0, 0.5, 2.0]),
            Array1::from_vec(vec![1.0, 2.0, 1.5, 0.5]),
            Array2::from_shape_vec((3, 4), vec![1.0, 0.8, 1.2, 1.0, 0.5, 1.0, 1.0, 2.0, 1.5, 0.7, 1.0, 0.9]).unwrap(),
        )
        .unwrap();

        // lambda sum_d W(d)^2 + gamma N F^2 with F = 4 / 3 = 1
        let expected_offset = 1.3 * (1.0 + 4.0 + 2.25 + 0.25) + 0.3 * 3.0;
        assert!((p.energy_offset() - expected_offset).abs() < 1e-12);

        let qubo = p.to_qubo();
        for bits in 0..1usize << p.size() {
            let state: Vec<usize> = (0..p.size()).map(|i| (bits >> i) & 1).collect();
            let direct = p.hamiltonian(&state).unwrap();
            let via_qubo = qubo.eval_usize(&Array1::from_vec(state));
            assert!((direct - via_qubo).abs() < 1e-9, "state {bits:b}");
        }
    }

    #[test]
    fn perfect_roster_has_zero_energy() {
        // one nurse per day, rotating, nobody on consecutive days, everyone on one day
        let p = problem(3, 3);
        let mut state = vec![0; 9];
        for d in 0..3 {
            state[p.index(d, d)] = 1;
        }
        assert!(p.to_qubo().eval_usize(&Array1::from_vec(state)).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_profiles() {
        let err = NurseProblem::with_profiles(
            2,
            3,
            Penalties::default(),
            Array1::ones(3),
            Array1::ones(3),
            Array2::ones((2, 3)),
        );
        assert!(matches!(err, Err(NurseError::InvalidProblem(_))));
        assert!(NurseProblem::new(0, 5, Penalties::default()).is_err());
    }
}
