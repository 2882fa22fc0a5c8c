//! Sparse QUBO coefficients keyed by variable index pairs.
//!
//! This is the dictionary form of a QUBO: entry `(i, i)` is the linear bias of `x_i`, and entry `(i, j)` with
//! `i < j` is the coupling of `x_i x_j`. Pairs are always stored in canonical order, so `(j, i)` and `(i, j)` refer
//! to the same coupling.

use crate::qubo::Qubo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(usize, usize, f64)>", into = "Vec<(usize, usize, f64)>")]
pub struct QuboCoefficients {
    entries: BTreeMap<(usize, usize), f64>,
}

const fn canonical(i: usize, j: usize) -> (usize, usize) {
    if i <= j {
        (i, j)
    } else {
        (j, i)
    }
}

impl QuboCoefficients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the coefficient of the pair.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.entries.insert(canonical(i, j), value);
    }

    /// Accumulates into the coefficient of the pair, starting from zero if it is not present.
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        *self.entries.entry(canonical(i, j)).or_insert(0.0) += value;
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.entries.get(&canonical(i, j)).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.entries.contains_key(&canonical(i, j))
    }

    /// Iterates over `(i, j, value)` with `i <= j`, in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries.iter().map(|(&(i, j), &v)| (i, j, v))
    }

    /// Iterates over the off diagonal couplings only.
    pub fn interactions(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.iter().filter(|(i, j, _)| i != j)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One more than the largest index present, 0 for an empty mapping.
    pub fn num_variables(&self) -> usize {
        self.entries
            .keys()
            .map(|&(_, j)| j + 1)
            .max()
            .unwrap_or(0)
    }

    /// Energy of a binary state, `sum_ij Q_ij x_i x_j + offset`. Indices past the end of `x` count as 0.
    pub fn energy(&self, x: &[usize], offset: f64) -> f64 {
        let bit = |k: usize| x.get(k).copied().unwrap_or(0);
        self.iter()
            .filter(|&(i, j, _)| bit(i) == 1 && bit(j) == 1)
            .map(|(_, _, v)| v)
            .sum::<f64>()
            + offset
    }

    pub fn to_qubo(&self, offset: f64) -> Qubo {
        Qubo::from_coefficients(self, offset)
    }

    /// Reads the coefficients back out of a matrix form QUBO, folding `Q[i, j]` and `Q[j, i]` into one entry.
    pub fn from_qubo(qubo: &Qubo) -> Self {
        let mut coeffs = Self::new();
        for (i, value) in qubo.c.iter().enumerate() {
            if *value != 0.0 {
                coeffs.add(i, i, *value);
            }
        }
        for (value, (i, j)) in qubo.q.iter() {
            if *value == 0.0 {
                continue;
            }
            // the 0.5 of the matrix form
            coeffs.add(i, j, 0.5 * value);
        }
        coeffs
    }
}

impl From<Vec<(usize, usize, f64)>> for QuboCoefficients {
    fn from(triplets: Vec<(usize, usize, f64)>) -> Self {
        let mut coeffs = Self::new();
        for (i, j, v) in triplets {
            coeffs.add(i, j, v);
        }
        coeffs
    }
}

impl From<QuboCoefficients> for Vec<(usize, usize, f64)> {
    fn from(coeffs: QuboCoefficients) -> Self {
        coeffs.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use proptest::prelude::*;

    #[test]
    fn pair_order_is_canonical() {
        let mut coeffs = QuboCoefficients::new();
        coeffs.add(3, 1, 2.0);
        coeffs.add(1, 3, 0.5);

        assert_eq!(coeffs.len(), 1);
        assert_eq!(coeffs.get(1, 3), 2.5);
        assert_eq!(coeffs.get(3, 1), 2.5);
        assert_eq!(coeffs.num_variables(), 4);
    }

    #[test]
    fn set_overwrites() {
        let mut coeffs = QuboCoefficients::new();
        coeffs.add(0, 1, 1.0);
        coeffs.set(1, 0, 3.5);
        assert_eq!(coeffs.get(0, 1), 3.5);
    }

    #[test]
    fn empty_mapping() {
        let coeffs = QuboCoefficients::new();
        assert!(coeffs.is_empty());
        assert_eq!(coeffs.num_variables(), 0);
        assert_eq!(coeffs.energy(&[], 1.5), 1.5);
    }

    #[test]
    fn json_is_a_triplet_list() {
        let mut coeffs = QuboCoefficients::new();
        coeffs.add(0, 0, -1.0);
        coeffs.add(1, 0, 2.0);

        let text = serde_json::to_string(&coeffs).unwrap();
        assert_eq!(text, "[[0,0,-1.0],[0,1,2.0]]");
    }

    #[test]
    fn matrix_form_keeps_coefficients() {
        let mut coeffs = QuboCoefficients::new();
        coeffs.add(0, 0, -1.0);
        coeffs.add(0, 2, 2.0);
        coeffs.add(1, 2, -0.5);

        let back = QuboCoefficients::from_qubo(&coeffs.to_qubo(0.0));
        assert_eq!(back, coeffs);
    }

    proptest! {
        #[test]
        fn matrix_and_dictionary_energies_agree(
            triplets in prop::collection::vec((0usize..6, 0usize..6, -5.0f64..5.0), 1..20),
            bits in prop::collection::vec(0usize..2, 6),
            offset in -3.0f64..3.0,
        ) {
            let coeffs = QuboCoefficients::from(triplets);
            let n = coeffs.num_variables();
            let x = &bits[..n];

            let p = coeffs.to_qubo(offset);
            let matrix_energy = p.eval_usize(&Array1::from_vec(x.to_vec()));
            prop_assert!((matrix_energy - coeffs.energy(x, offset)).abs() < 1e-9);
        }
    }
}
