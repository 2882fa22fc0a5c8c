//! Starting points for anneal reads.

use crate::errors::{NurseError, Result};
use ndarray::Array1;
use smolprng::{Algorithm, PRNG};

/// Generates a random binary point, each bit is 1 with probability `sparsity`.
pub fn generate_random_binary_point<T: Algorithm>(
    num_x: usize,
    prng: &mut PRNG<T>,
    sparsity: f64,
) -> Array1<usize> {
    let mut x = Array1::<usize>::zeros(num_x);
    for i in 0..x.len() {
        if prng.gen_f64() < sparsity {
            x[i] = 1;
        }
    }
    x
}

/// Checks that a user supplied state is binary and sized for the problem.
pub fn checked_binary_point(state: &[usize], num_x: usize) -> Result<Array1<usize>> {
    if state.len() != num_x {
        return Err(NurseError::StateLength {
            expected: num_x,
            found: state.len(),
        });
    }
    if let Some(bad) = state.iter().find(|&&b| b > 1) {
        return Err(NurseError::InvalidProblem(format!(
            "state contains non binary value {bad}"
        )));
    }
    Ok(Array1::from_vec(state.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smolprng::JsfLarge;

    #[test]
    fn random_point_is_binary() {
        let mut prng = PRNG {
            generator: JsfLarge::default(),
        };
        let x = generate_random_binary_point(100, &mut prng, 0.5);
        assert_eq!(x.len(), 100);
        assert!(x.iter().all(|&b| b <= 1));
        assert!(x.sum() > 0 && x.sum() < 100);
    }

    #[test]
    fn sparsity_extremes() {
        let mut prng = PRNG {
            generator: JsfLarge::default(),
        };
        assert_eq!(generate_random_binary_point(10, &mut prng, 0.0).sum(), 0);
        assert_eq!(generate_random_binary_point(10, &mut prng, 1.1).sum(), 10);
    }

    #[test]
    fn checks_states() {
        assert!(checked_binary_point(&[0, 1, 1], 3).is_ok());
        assert!(matches!(
            checked_binary_point(&[0, 1], 3),
            Err(NurseError::StateLength { expected: 3, found: 2 })
        ));
        assert!(checked_binary_point(&[0, 2, 1], 3).is_err());
    }
}
