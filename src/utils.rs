//! This is the general Utils module, which contains functions that are used by multiple parts of the crate and there
//! is not a better place to put them as of yet.

/// Computes the hamming distance of two points, counting positions past the end of the shorter one as different.
pub fn calculate_hamming_distance(x_0: &[usize], x_1: &[usize]) -> usize {
    let common = x_0.iter().zip(x_1).filter(|(a, b)| a != b).count();
    common + x_0.len().abs_diff(x_1.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming() {
        assert_eq!(calculate_hamming_distance(&[1, 0, 1], &[1, 1, 1]), 1);
        assert_eq!(calculate_hamming_distance(&[1, 0, 1], &[0, 1, 0]), 3);
        assert_eq!(calculate_hamming_distance(&[1, 0], &[1, 0, 1]), 1);
        assert_eq!(calculate_hamming_distance(&[], &[]), 0);
    }
}
