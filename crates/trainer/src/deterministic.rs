//! Deterministic utilities for reproducible training
//!
//! Provides an LCG for row subsampling, a row hash for shuffling, and the
//! tie-breaker used when two splits have identical gain.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1103515245;
    const INCREMENT: u64 = 12345;
    const MODULUS: u64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next value in `[0, 2^31)`
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Next value in `[0, max)`
    pub fn next_range(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    /// Next value in `[0.0, 1.0)`
    pub fn next_unit(&mut self) -> f64 {
        self.next_u64() as f64 / Self::MODULUS as f64
    }

    /// Bernoulli row sample. Always keeps at least one row when `n > 0`.
    pub fn sample_rows(&mut self, n: usize, fraction: f64) -> Vec<usize> {
        if fraction >= 1.0 {
            return (0..n).collect();
        }

        let mut rows: Vec<usize> = (0..n).filter(|_| self.next_unit() < fraction).collect();
        if rows.is_empty() && n > 0 {
            rows.push(self.next_range(n as u64) as usize);
        }
        rows
    }
}

/// xxhash64-style mix over the bit patterns of a row, used to order rows.
pub fn hash_row(data: &[f64], seed: u64) -> u64 {
    const PRIME1: u64 = 0x9E3779B185EBCA87;
    const PRIME2: u64 = 0xC2B2AE3D27D4EB4F;
    const PRIME3: u64 = 0x165667B19E3779F9;
    const PRIME5: u64 = 0x85EBCA77C2B2AE63;

    let mut h = seed.wrapping_add(PRIME5);

    for &val in data {
        h = h.wrapping_add(val.to_bits().wrapping_mul(PRIME3));
        h = h.rotate_left(17).wrapping_mul(PRIME2);
    }

    h ^= h >> 33;
    h = h.wrapping_mul(PRIME1);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 32;

    h
}

/// Deterministic tie-breaker for split selection.
/// Orders by `(feature_idx, threshold_rank, node_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold_rank: usize,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold_rank: usize, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold_rank,
            node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_lcg_unit_range() {
        let mut rng = LcgRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_sample_rows() {
        let mut rng = LcgRng::new(42);
        assert_eq!(rng.sample_rows(5, 1.0), vec![0, 1, 2, 3, 4]);

        let rows = rng.sample_rows(1000, 0.5);
        assert!(rows.len() > 300 && rows.len() < 700);
        assert!(rows.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(rng.sample_rows(3, 1e-9).len(), 1);
        assert!(rng.sample_rows(0, 0.5).is_empty());
    }

    #[test]
    fn test_hash_row_seeded() {
        let data = vec![1.0, 2.5, -3.0];
        assert_eq!(hash_row(&data, 42), hash_row(&data, 42));
        assert_ne!(hash_row(&data, 42), hash_row(&data, 43));
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 3, 0);
        let t2 = SplitTieBreaker::new(0, 3, 1);
        let t3 = SplitTieBreaker::new(1, 0, 0);

        assert!(t1 < t2);
        assert!(t1 < t3);
    }
}
