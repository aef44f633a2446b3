//! Approximate distinct-count accumulator.
//!
//! Uses `hyperloglogplus` with `ahash` as the 64-bit hasher, the same pairing
//! `medialab-xan` depends on for its own cardinality estimation. 2^14 = 16384
//! registers per the spec's precision-14 default (~0.81% standard error).

use hyperloglogplus::{HyperLogLog, HyperLogLogPlus};
use std::hash::Hash;

const DEFAULT_PRECISION: u8 = 14;

pub struct DistinctEstimator {
    hll: HyperLogLogPlus<[u8], ahash::RandomState>,
}

impl DistinctEstimator {
    pub fn new() -> Self {
        Self::with_precision(DEFAULT_PRECISION)
    }

    pub fn with_precision(precision: u8) -> Self {
        let hll = HyperLogLogPlus::new(precision, ahash::RandomState::new())
            .expect("precision within hyperloglogplus's supported range (4..=18)");
        Self { hll }
    }

    /// Feed the canonical byte form of a value (see `RawField::as_text`, or
    /// the raw bytes for byte-oriented columns).
    pub fn insert(&mut self, bytes: &[u8]) {
        self.hll.insert(bytes);
    }

    pub fn estimate(&mut self) -> u64 {
        self.hll.count().round() as u64
    }
}

impl Default for DistinctEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Conservative upper bound used by pooled merge: since HLL registers from
/// distinct sketches can't be combined without the sketches themselves
/// (Comparison & Aggregation only sees the frozen count, not the sketch),
/// the spec mandates `min(sum of per-profile distinct estimates, count_total)`.
pub fn pooled_distinct_upper_bound(per_profile: &[u64], count_total: u64) -> u64 {
    let sum: u64 = per_profile.iter().sum();
    sum.min(count_total)
}

#[allow(dead_code)]
fn _assert_hashable<T: Hash>() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_small_cardinality() {
        let mut hll = DistinctEstimator::new();
        for v in ["a", "b", "c", "a", "b"] {
            hll.insert(v.as_bytes());
        }
        let est = hll.estimate();
        assert!((2..=4).contains(&est), "estimate {est} should be close to 3");
    }

    #[test]
    fn within_two_percent_for_moderate_cardinality() {
        let mut hll = DistinctEstimator::new();
        let k = 5_000usize;
        for i in 0..k {
            hll.insert(format!("value-{i}").as_bytes());
        }
        let est = hll.estimate() as f64;
        let err = (est - k as f64).abs() / k as f64;
        assert!(err <= 0.02, "relative error {err} exceeds 2% (est={est}, k={k})");
    }

    #[test]
    fn pooled_upper_bound_is_conservative() {
        assert_eq!(pooled_distinct_upper_bound(&[10, 20], 25), 25);
        assert_eq!(pooled_distinct_upper_bound(&[10, 5], 25), 15);
    }
}
