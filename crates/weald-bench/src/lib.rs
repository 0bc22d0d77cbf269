//! Shared helpers for Weald benchmarks.

#![forbid(unsafe_code)]

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use weald_core::ObjectKind;

/// Deterministic scatter of `n` world positions within `half_extent`
/// yards of the origin, paired with a kind drawn round-robin.
pub fn scatter(n: usize, half_extent: f32, seed: u64) -> Vec<(f32, f32, ObjectKind)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let x = rng.random_range(-half_extent..half_extent);
            let y = rng.random_range(-half_extent..half_extent);
            (x, y, ObjectKind::ALL[i % ObjectKind::COUNT])
        })
        .collect()
}
