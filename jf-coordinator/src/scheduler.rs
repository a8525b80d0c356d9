use std::time::{Duration, Instant};

use tracing::{error, info};

use common::{FarmError, Result, Tag, Transport, COORDINATOR};
use workload::JobSource;

use crate::jobs::JobQueue;
use crate::policy::Policy;
use crate::result_table::ResultTable;

/// Where a batch spent its time on the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchTimings {
    /// Generating job payloads.
    pub generate: Duration,

    /// Dispatching jobs and collecting results, generation excluded.
    pub dispatch: Duration,

    /// The whole batch, termination included.
    pub total: Duration,
}

/// Drives one batch on the coordinator: runs the policy, checks that every
/// job has its result, then tells every worker to stop.
pub struct Scheduler {
    policy: Box<dyn Policy>,
}

impl Scheduler {
    pub fn new(policy: Box<dyn Policy>) -> Self {
        Self { policy }
    }

    pub async fn run(&self, jobs: &JobSource, transport: &mut dyn Transport) -> Result<ResultTable> {
        let (table, _) = self.run_timed(jobs, transport).await?;
        Ok(table)
    }

    /// Like [`Scheduler::run`], also reporting where the time went.
    pub async fn run_timed(
        &self,
        jobs: &JobSource,
        transport: &mut dyn Transport,
    ) -> Result<(ResultTable, BatchTimings)> {
        if transport.rank() != COORDINATOR {
            return Err(FarmError::Config(format!(
                "the scheduler must run on rank {COORDINATOR}, not {}",
                transport.rank()
            )));
        }
        let workers = worker_count(transport.peer_count())?;

        info!(
            "Running {} jobs of {} elements on {} workers with the {} policy",
            jobs.job_count(),
            jobs.elements_per_job(),
            workers,
            self.policy.name()
        );
        let started = Instant::now();

        let mut queue = JobQueue::new(jobs);
        let table = self.policy.run(&mut queue, workers, transport).await?;
        let generate = queue.generation_time();
        let dispatch = started.elapsed().saturating_sub(generate);

        if !table.is_complete() {
            let missing = table.missing();
            error!("Policy {} left {} jobs without a result", self.policy.name(), missing.len());
            return Err(FarmError::Protocol(format!(
                "no result for jobs {missing:?}"
            )));
        }

        terminate_workers(transport, workers)?;
        let timings = BatchTimings {
            generate,
            dispatch,
            total: started.elapsed(),
        };
        info!(
            "Batch finished in {:.3} ms ({:.3} ms generating jobs)",
            timings.total.as_secs_f64() * 1000.0,
            timings.generate.as_secs_f64() * 1000.0
        );

        Ok((table, timings))
    }
}

/// Number of workers in a cluster of `peer_count` peers.
pub fn worker_count(peer_count: usize) -> Result<usize> {
    match peer_count.checked_sub(1) {
        Some(workers) if workers > 0 => Ok(workers),
        _ => Err(FarmError::Config(
            "at least one worker peer is required".into(),
        )),
    }
}

/// Send the termination message to workers 1..=workers. Must only happen
/// once every job is dispatched and every result merged: it is the last
/// message each worker gets from the coordinator.
pub fn terminate_workers(transport: &dyn Transport, workers: usize) -> Result<()> {
    for worker in 1..=workers {
        transport.send(worker, Tag::Terminate, Vec::new())?;
    }
    info!("Sent termination to {} workers", workers);
    Ok(())
}
