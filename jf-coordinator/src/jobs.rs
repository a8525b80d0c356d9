use std::time::{Duration, Instant};

use common::{Job, JobId};
use workload::JobSource;

/// Dispatch cursor over a batch.
///
/// Jobs are generated one at a time, right before they are handed out, so
/// at most one undispatched payload is alive on the coordinator. Time spent
/// generating payloads is added up separately from everything else.
#[derive(Debug)]
pub struct JobQueue<'a> {
    source: &'a JobSource,

    /// Id of the next job to hand out.
    current_index: JobId,

    generation_time: Duration,
}

impl<'a> JobQueue<'a> {
    pub fn new(source: &'a JobSource) -> Self {
        Self {
            source,
            current_index: 0,
            generation_time: Duration::ZERO,
        }
    }

    pub fn source(&self) -> &JobSource {
        self.source
    }

    /// Number of jobs in the batch.
    pub fn len(&self) -> usize {
        self.source.job_count()
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_jobs_pending() == 0
    }

    /// Jobs not handed out yet.
    pub fn number_of_jobs_pending(&self) -> usize {
        self.len() - self.current_index
    }

    /// Jobs already handed out.
    pub fn number_of_jobs_processed(&self) -> usize {
        self.current_index
    }

    /// Total time spent generating the jobs popped so far.
    pub fn generation_time(&self) -> Duration {
        self.generation_time
    }

    /// Generate the next job and advance.
    pub fn pop_job(&mut self) -> Option<Job> {
        if self.current_index >= self.len() {
            return None;
        }
        let started = Instant::now();
        let job = self.source.job(self.current_index);
        self.generation_time += started.elapsed();
        self.current_index += 1;
        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_every_job_once() {
        let source = JobSource::new(3, 2, 3);
        let mut queue = JobQueue::new(&source);
        assert_eq!(queue.number_of_jobs_pending(), 3);

        let ids = std::iter::from_fn(|| queue.pop_job())
            .map(|job| job.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![0, 1, 2]);
        assert!(queue.is_empty());
        assert_eq!(queue.number_of_jobs_processed(), 3);
        assert!(queue.pop_job().is_none());
    }

    #[test]
    fn generation_time_only_grows_when_jobs_are_popped() {
        let source = JobSource::new(3, 4096, 2);
        let mut queue = JobQueue::new(&source);
        assert_eq!(queue.generation_time(), Duration::ZERO);

        queue.pop_job();
        let after_one = queue.generation_time();
        queue.pop_job();
        assert!(queue.generation_time() >= after_one);

        let total = queue.generation_time();
        assert!(queue.pop_job().is_none());
        assert_eq!(queue.generation_time(), total);
    }
}
