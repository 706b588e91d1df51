//! Stratified bootstrap resampling (`stratified_bootstrap`).
//!
//! Rows are partitioned by `(vintage, target)`. Each partition draws, with
//! replacement, as many rows as it holds; a row's raw weight is the number of
//! times it was drawn. Total mass therefore equals the row count exactly.
//!
//! Partitions are drawn in parallel. Each one owns a `StdRng` seeded from the
//! user seed mixed with the partition key, so the outcome does not depend on
//! scheduling order.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::Vintage;
use crate::io::Observations;
use crate::math::derive_seed;

type PartitionKey = (Vintage, bool);

fn partition_seed(seed: u64, (vintage, bad): PartitionKey) -> u64 {
    derive_seed(seed, &[vintage.ordinal() as u64, u64::from(bad)])
}

/// Draw counts for one partition of size `n`.
fn draw_counts(n: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counts = vec![0u32; n];
    for _ in 0..n {
        counts[rng.gen_range(0..n)] += 1;
    }
    counts
}

/// `stratified_bootstrap` raw weights for a given seed.
pub fn bootstrap_counts(obs: &Observations, seed: u64) -> Vec<f64> {
    let mut partitions: BTreeMap<PartitionKey, Vec<usize>> = BTreeMap::new();
    for (row, (&vintage, &bad)) in obs.vintages.iter().zip(&obs.targets).enumerate() {
        partitions.entry((vintage, bad)).or_default().push(row);
    }
    let partitions: Vec<(PartitionKey, Vec<usize>)> = partitions.into_iter().collect();

    let draws: Vec<(&[usize], Vec<u32>)> = partitions
        .par_iter()
        .map(|(key, rows)| (rows.as_slice(), draw_counts(rows.len(), partition_seed(seed, *key))))
        .collect();

    let mut out = vec![0.0; obs.len()];
    for (rows, counts) in draws {
        for (&row, &count) in rows.iter().zip(&counts) {
            out[row] = f64::from(count);
        }
    }
    out
}
