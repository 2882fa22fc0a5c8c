//! The matrix form of a QUBO, `f(x) = 0.5 x'Qx + c'x + offset`, over binary points.

use crate::coefficients::QuboCoefficients;
use ndarray::Array1;
use smolprng::{Algorithm, PRNG};
use sprs::{CsMat, TriMat};

#[derive(Clone, Debug)]
pub struct Qubo {
    pub q: CsMat<f64>,
    pub c: Array1<f64>,
    pub offset: f64,
}

impl Qubo {
    pub fn new(q: CsMat<f64>) -> Self {
        let num_vars = q.cols();
        Self {
            q,
            c: Array1::<f64>::zeros(num_vars),
            offset: 0.0,
        }
    }

    pub fn new_with_c(q: CsMat<f64>, c: Array1<f64>) -> Self {
        Self { q, c, offset: 0.0 }
    }

    /// Attaches a constant energy offset, which every evaluation includes.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Builds the matrix form from a sparse coefficient mapping.
    ///
    /// Diagonal coefficients are linear biases and land in `c`, as `x_i^2 = x_i` for binary points. Off diagonal
    /// coefficients are written to both `Q[i, j]` and `Q[j, i]` so that the `0.5` factor of the matrix form
    /// recovers the original coefficient.
    ///
    /// Example:
    /// ``` rust
    /// use nurse_anneal::coefficients::QuboCoefficients;
    /// use nurse_anneal::qubo::Qubo;
    /// use ndarray::Array1;
    ///
    /// let mut coeffs = QuboCoefficients::new();
    /// coeffs.add(0, 0, -1.0);
    /// coeffs.add(0, 1, 2.0);
    ///
    /// let p = Qubo::from_coefficients(&coeffs, 0.5);
    /// assert_eq!(p.eval_usize(&Array1::from_vec(vec![1, 1])), 1.5);
    /// ```
    pub fn from_coefficients(coeffs: &QuboCoefficients, offset: f64) -> Self {
        Self::from_coefficients_with_size(coeffs, coeffs.num_variables(), offset)
    }

    /// As [`Qubo::from_coefficients`], padded with free variables up to `num_x`.
    pub fn from_coefficients_with_size(coeffs: &QuboCoefficients, num_x: usize, offset: f64) -> Self {
        let num_x = num_x.max(coeffs.num_variables());
        let mut q = TriMat::<f64>::new((num_x, num_x));
        let mut c = Array1::<f64>::zeros(num_x);

        for (i, j, value) in coeffs.iter() {
            if i == j {
                c[i] += value;
            } else {
                q.add_triplet(i, j, value);
                q.add_triplet(j, i, value);
            }
        }

        Self {
            q: q.to_csr(),
            c,
            offset,
        }
    }

    pub fn make_random_qubo<T: Algorithm>(num_x: usize, prng: &mut PRNG<T>, sparsity: f64) -> Self {
        let mut q = TriMat::<f64>::new((num_x, num_x));
        for i in 0..num_x {
            for j in i..num_x {
                if prng.gen_f64() < sparsity {
                    q.add_triplet(i, j, prng.gen_f64() - 0.5f64);
                }
            }
        }

        // generate random c
        let mut c = Array1::<f64>::zeros(num_x);
        for i in 0..num_x {
            c[i] = prng.gen_f64() - 0.5f64;
        }

        Self::new_with_c(q.to_csr(), c)
    }

    pub fn num_x(&self) -> usize {
        self.q.cols()
    }

    /// Computes `Qx` by walking the non-zero entries.
    fn mat_vec(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::<f64>::zeros(self.q.rows());
        for (value, (i, j)) in self.q.iter() {
            y[i] += value * x[j];
        }
        y
    }

    /// Computes `Q'x` by walking the non-zero entries.
    fn mat_t_vec(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::<f64>::zeros(self.q.cols());
        for (value, (i, j)) in self.q.iter() {
            y[j] += value * x[i];
        }
        y
    }

    pub fn eval(&self, x: &Array1<f64>) -> f64 {
        let temp = self.mat_vec(x);
        0.5 * x.dot(&temp) + self.c.dot(x) + self.offset
    }

    pub fn eval_usize(&self, x: &Array1<usize>) -> f64 {
        self.eval(&x.mapv(|v| v as f64))
    }

    /// Takes the gradient of the QUBO at x, does not assume that the QUBO is symmetric
    pub fn eval_grad_usize(&self, x: &Array1<usize>) -> Array1<f64> {
        let x_f = x.mapv(|v| v as f64);
        0.5 * (self.mat_vec(&x_f) + self.mat_t_vec(&x_f)) + &self.c
    }

    /// Efficient calculation of the delta of the objective function for a single bit flip for each variable.
    /// Returns the objective at `x_0` alongside the per variable change in objective.
    ///
    /// Run time is O(|Q|) + O(|x|)
    pub fn one_flip_objective(&self, x_0: &Array1<usize>) -> (f64, Array1<f64>) {
        let mut objs = Array1::<f64>::zeros(self.num_x());
        let x_0f = x_0.mapv(|x| x as f64);

        let x_q = 0.5 * self.mat_vec(&x_0f);
        let q_x = 0.5 * self.mat_t_vec(&x_0f);
        let q_jj = 0.5 * self.diagonal();
        let delta = 1.0 - 2.0 * &x_0f;

        for i in 0..self.num_x() {
            objs[i] = q_jj[i] + delta[i] * (x_q[i] + q_x[i] + self.c[i]);
        }

        let obj_0 = x_0f.dot(&x_q) + self.c.dot(&x_0f) + self.offset;

        (obj_0, objs)
    }

    pub fn diagonal(&self) -> Array1<f64> {
        let mut d = Array1::<f64>::zeros(self.num_x());
        for (value, (i, j)) in self.q.iter() {
            if i == j {
                d[i] += value;
            }
        }
        d
    }

    /// Linear part of the objective on binary points, `c_i + 0.5 Q_ii`.
    pub fn linear_terms(&self) -> Array1<f64> {
        &self.c + &(0.5 * self.diagonal())
    }

    /// Adjacency lists of the interaction graph. Each entry `(j, w)` of row `i` is half of `Q[i, j]` or `Q[j, i]`,
    /// so summing the entries for a pair gives the full pairwise coupling `0.5 (Q_ij + Q_ji)`.
    pub fn neighbors(&self) -> Vec<Vec<(usize, f64)>> {
        let mut neighbors = vec![Vec::new(); self.num_x()];
        for (value, (i, j)) in self.q.iter() {
            if i != j && *value != 0.0 {
                neighbors[i].push((j, 0.5 * value));
                neighbors[j].push((i, 0.5 * value));
            }
        }
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smolprng::JsfLarge;

    #[test]
    fn eval_identity() {
        let p = Qubo::new(CsMat::eye(3));
        assert_eq!(p.eval(&Array1::from_vec(vec![1.0, 2.0, 3.0])), 7.0);
    }

    #[test]
    fn offset_is_added() {
        let p = Qubo::new(CsMat::eye(2)).with_offset(2.5);
        assert_eq!(p.eval_usize(&Array1::from_vec(vec![0, 0])), 2.5);
        assert_eq!(p.eval_usize(&Array1::from_vec(vec![1, 0])), 3.0);
    }

    #[test]
    fn one_flip_matches_brute_force() {
        let mut prng = PRNG {
            generator: JsfLarge::default(),
        };
        let p = Qubo::make_random_qubo(12, &mut prng, 0.4).with_offset(1.25);
        let x_0 = Array1::from_vec(vec![1, 0, 1, 1, 0, 0, 1, 0, 1, 0, 0, 1]);

        let (obj_0, objs) = p.one_flip_objective(&x_0);
        assert!((obj_0 - p.eval_usize(&x_0)).abs() < 1e-9);

        for i in 0..p.num_x() {
            let mut x_1 = x_0.clone();
            x_1[i] = 1 - x_1[i];
            let expected = p.eval_usize(&x_1) - p.eval_usize(&x_0);
            assert!((objs[i] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn neighbors_and_linear_terms_reproduce_objective() {
        let mut prng = PRNG {
            generator: JsfLarge::from(7u64),
        };
        let p = Qubo::make_random_qubo(8, &mut prng, 0.5);
        let x = Array1::from_vec(vec![1, 1, 0, 1, 0, 1, 1, 0]);

        let linear = p.linear_terms();
        let neighbors = p.neighbors();
        let mut energy = 0.0;
        for i in 0..p.num_x() {
            if x[i] == 1 {
                energy += linear[i];
                // every pair is visited from both sides
                for (j, w) in &neighbors[i] {
                    energy += 0.5 * w * x[*j] as f64;
                }
            }
        }

        assert!((energy - p.eval_usize(&x)).abs() < 1e-9);
    }

    #[test]
    fn gradient_of_symmetric_qubo() {
        let mut q = TriMat::new((2, 2));
        q.add_triplet(0, 1, 2.0);
        q.add_triplet(1, 0, 2.0);
        let p = Qubo::new_with_c(q.to_csr(), Array1::from_vec(vec![1.0, -1.0]));

        let grad = p.eval_grad_usize(&Array1::from_vec(vec![1, 0]));
        assert_eq!(grad, Array1::from_vec(vec![1.0, 1.0]));
    }
}
