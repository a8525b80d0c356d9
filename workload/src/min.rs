//! Smallest element of each job.

use anyhow::{anyhow, Result};

pub fn reduce(payload: &[i64]) -> Result<i64> {
    payload
        .iter()
        .copied()
        .min()
        .ok_or_else(|| anyhow!("Cannot take the min of an empty payload"))
}

pub fn combine(left: i64, right: i64) -> i64 {
    left.min(right)
}
