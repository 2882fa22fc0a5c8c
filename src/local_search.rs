//! # Local Search
//!
//! Greedy single bit flip descent, used to polish the final state of each anneal read:
//! - One step local search
//! - Simple local search
//! - Multi simple local search

use crate::qubo::Qubo;
use ndarray::Array1;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// Performs a single step of local search, which is to say that it will flip a single bit and return the best solution out of all
/// of the possible bit flips among the selected variables.
/// This takes O(|Q|) + O(n) time, where |Q| is the number of non-zero elements in the QUBO matrix.
///
/// Example:
/// ``` rust
/// use nurse_anneal::qubo::Qubo;
/// use nurse_anneal::local_search;
/// use ndarray::Array1;
/// use smolprng::{PRNG, JsfLarge};
///
/// let mut prng = PRNG {
///    generator: JsfLarge::default(),
/// };
/// let p = Qubo::make_random_qubo(10, &mut prng, 0.5);
/// let x_0 = Array1::<usize>::zeros(10);
///
/// let x_1 = local_search::one_step_local_search_improved(&p, &x_0, &(0..10).collect::<Vec<usize>>());
/// assert!(p.eval_usize(&x_1) <= p.eval_usize(&x_0));
/// ```
pub fn one_step_local_search_improved(
    qubo: &Qubo,
    x_0: &Array1<usize>,
    selected_vars: &Vec<usize>,
) -> Array1<usize> {
    let (_, objs) = qubo.one_flip_objective(x_0);

    let best_neighbor = selected_vars
        .iter()
        .copied()
        .filter(|&i| i < objs.len())
        .min_by(|&a, &b| objs[a].total_cmp(&objs[b]));

    match best_neighbor {
        Some(i) if objs[i] < 0.0f64 => {
            let mut x_1 = x_0.clone();
            x_1[i] = 1 - x_1[i];
            x_1
        }
        _ => x_0.clone(),
    }
}

/// Given a QUBO and an integral initial point, run simple local search until the point converges or the step limit is hit.
pub fn simple_local_search(qubo: &Qubo, x_0: &Array1<usize>, max_steps: usize) -> Array1<usize> {
    let mut x = x_0.clone();
    let variables = (0..qubo.num_x()).collect();
    let mut x_1 = one_step_local_search_improved(qubo, &x, &variables);
    let mut steps = 0;

    while x_1 != x && steps <= max_steps {
        x = x_1.clone();
        x_1 = one_step_local_search_improved(qubo, &x, &variables);
        steps += 1;
    }

    x_1
}

/// Given a QUBO and a vector of initial points, run local searches on each initial point and return all of the solutions.
pub fn multi_simple_local_search(qubo: &Qubo, xs: &Vec<Array1<usize>>) -> Vec<Array1<usize>> {
    xs.par_iter()
        .map(|x| simple_local_search(qubo, x, usize::MAX))
        .collect()
}
