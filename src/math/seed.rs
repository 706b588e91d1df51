//! Deterministic seed derivation.
//!
//! Partitions of the stratified bootstrap draw from independent generators; each
//! generator's seed is derived from the user seed and the partition key, so the
//! outcome does not depend on which partition runs first.

/// One SplitMix64 step (Steele, Lea & Flood). Bijective on `u64`.
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fold `parts` into `base`, one SplitMix64 round per part.
pub fn derive_seed(base: u64, parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(splitmix64(base), |acc, &part| splitmix64(acc ^ part))
}
