//! Sum of the elements of each job.
//!
//! Addition wraps so partial sums can be combined in any order and still
//! agree with the sum over the whole payload.

use anyhow::{anyhow, Result};

pub fn reduce(payload: &[i64]) -> Result<i64> {
    if payload.is_empty() {
        return Err(anyhow!("Cannot sum an empty payload"));
    }
    Ok(payload.iter().fold(0i64, |acc, value| acc.wrapping_add(*value)))
}

pub fn combine(left: i64, right: i64) -> i64 {
    left.wrapping_add(right)
}
