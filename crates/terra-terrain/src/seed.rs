//! Deterministic per-chunk seeds.
//!
//! A chunk's decoration RNG is keyed off its cached world-space center and the
//! planet's seed offset, so revisiting the same chunk (after a merge and a
//! re-subdivide) reproduces the same scatter.

use glam::DVec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive the seed for a chunk from its center and the planet seed offset.
///
/// The weighted sum is truncated toward zero, then reinterpreted as `u64`.
pub fn chunk_seed(center: DVec3, seed_offset: DVec3) -> u64 {
    let combined = center.x * 100.0 + center.y * 50.0 + center.z * 100.0 + seed_offset.x;
    // `as i64` saturates on overflow and maps NaN to 0.
    combined as i64 as u64
}

/// Deterministic RNG for a chunk seed.
pub fn chunk_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
