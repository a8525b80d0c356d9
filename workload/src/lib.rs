//! Job payload generation and the reductions workers apply to jobs.
//!
//! The scheduler never looks inside a payload. It only needs a
//! [`JobSource`] to materialize jobs and, for the broadcast policy, a way
//! to merge partial results, which every [`Workload`] provides.

use std::fmt;

pub mod max;
pub mod min;
pub mod source;
pub mod sum;

pub use source::{generate, JobSource};

/// Collapses one payload into a single value.
pub type ReduceFn = fn(payload: &[i64]) -> anyhow::Result<i64>;

/// Merges two partial results of the same job. Must be associative and
/// commutative: partial results arrive in no particular order.
pub type CombineFn = fn(left: i64, right: i64) -> i64;

/// A named reduction.
#[derive(Copy, Clone)]
pub struct Workload {
    pub name: &'static str,
    pub reduce_fn: ReduceFn,
    pub combine_fn: CombineFn,
}

impl Workload {
    pub fn reduce(&self, payload: &[i64]) -> anyhow::Result<i64> {
        (self.reduce_fn)(payload)
    }

    pub fn combine(&self, left: i64, right: i64) -> i64 {
        (self.combine_fn)(left, right)
    }
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workload").field("name", &self.name).finish()
    }
}

/// Names accepted by [`try_named`].
pub const NAMES: [&str; 3] = ["max", "min", "sum"];

/// Look up a workload by name.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "max" => Some(Workload {
            name: "max",
            reduce_fn: max::reduce,
            combine_fn: max::combine,
        }),
        "min" => Some(Workload {
            name: "min",
            reduce_fn: min::reduce,
            combine_fn: min::combine,
        }),
        "sum" => Some(Workload {
            name: "sum",
            reduce_fn: sum::reduce,
            combine_fn: sum::combine,
        }),
        _ => None,
    }
}
