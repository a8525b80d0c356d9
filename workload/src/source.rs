//! Deterministic job payloads.
//!
//! The whole batch is one PCG32 stream seeded from the user seed: job `k`
//! of `n` elements is made of draws `k*n .. (k+1)*n`. The generator can
//! jump ahead in logarithmic time, so any job can be materialized on its
//! own without generating the jobs before it.

use rand::RngCore;
use rand_pcg::Pcg32;

use common::{Job, JobId};

/// Stream selector shared by every batch.
const STREAM: u64 = 0xda3e39cb94b95bdb;

/// Generate the payload of job `job_index` for a batch where every job
/// has `size` elements. Elements are in `0..2^32`.
pub fn generate(seed: u64, job_index: JobId, size: usize) -> Vec<i64> {
    let mut rng = Pcg32::new(seed, STREAM);
    rng.advance((job_index as u64).wrapping_mul(size as u64));
    (0..size).map(|_| i64::from(rng.next_u32())).collect()
}

/// A batch of `job_count` jobs of `elements_per_job` elements each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSource {
    seed: u64,
    elements_per_job: usize,
    job_count: usize,
}

impl JobSource {
    pub fn new(seed: u64, elements_per_job: usize, job_count: usize) -> Self {
        Self {
            seed,
            elements_per_job,
            job_count,
        }
    }

    pub fn elements_per_job(&self) -> usize {
        self.elements_per_job
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    /// Materialize job `id`. The caller owns the payload.
    pub fn job(&self, id: JobId) -> Job {
        Job::new(id, generate(self.seed, id, self.elements_per_job))
    }

    /// All jobs of the batch, generated lazily in id order.
    pub fn jobs(&self) -> impl Iterator<Item = Job> + '_ {
        (0..self.job_count).map(|id| self.job(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_payload() {
        assert_eq!(generate(42, 3, 16), generate(42, 3, 16));
        assert_ne!(generate(42, 3, 16), generate(43, 3, 16));
    }

    #[test]
    fn jobs_are_consecutive_slices_of_one_stream() {
        let whole = generate(7, 0, 12);

        assert_eq!(generate(7, 0, 4), whole[0..4]);
        assert_eq!(generate(7, 1, 4), whole[4..8]);
        assert_eq!(generate(7, 2, 4), whole[8..12]);
    }

    #[test]
    fn elements_fit_in_u32() {
        let payload = generate(1, 5, 256);
        assert_eq!(payload.len(), 256);
        assert!(payload
            .iter()
            .all(|value| (0..=i64::from(u32::MAX)).contains(value)));
    }

    #[test]
    fn source_numbers_jobs_in_creation_order() {
        let source = JobSource::new(1, 4, 3);
        let jobs = source.jobs().collect::<Vec<_>>();

        assert_eq!(jobs.len(), 3);
        for (index, job) in jobs.iter().enumerate() {
            assert_eq!(job.id, index);
            assert_eq!(job.payload, generate(1, index, 4));
        }
    }

    #[test]
    fn empty_batch() {
        let source = JobSource::new(1, 4, 0);
        assert_eq!(source.jobs().count(), 0);
    }
}
