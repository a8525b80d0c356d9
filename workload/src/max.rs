//! Largest element of each job. The default workload.

use anyhow::{anyhow, Result};

pub fn reduce(payload: &[i64]) -> Result<i64> {
    payload
        .iter()
        .copied()
        .max()
        .ok_or_else(|| anyhow!("Cannot take the max of an empty payload"))
}

pub fn combine(left: i64, right: i64) -> i64 {
    left.max(right)
}
