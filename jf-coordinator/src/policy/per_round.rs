use async_trait::async_trait;
use tracing::debug;

use common::{Result, Transport};

use super::{assigned_worker, collect_from, dispatch, Policy};
use crate::jobs::JobQueue;
use crate::result_table::ResultTable;

/// Round robin in rounds of `workers` jobs.
///
/// A round is dispatched, then all of its results are collected before the
/// next round starts. At most `workers` jobs are in flight at any time.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerRound;

#[async_trait]
impl Policy for PerRound {
    fn name(&self) -> &'static str {
        "per-round"
    }

    async fn run(
        &self,
        jobs: &mut JobQueue<'_>,
        workers: usize,
        transport: &mut dyn Transport,
    ) -> Result<ResultTable> {
        let mut table = ResultTable::new(jobs.len());
        let mut round = 0;

        while !jobs.is_empty() {
            let first = jobs.number_of_jobs_processed();
            let size = workers.min(jobs.number_of_jobs_pending());
            debug!("Round {}: jobs {}..{}", round, first, first + size);

            for _ in 0..size {
                if let Some(job) = jobs.pop_job() {
                    let worker = assigned_worker(job.id, workers);
                    dispatch(transport, worker, job)?;
                }
            }

            for job_id in first..first + size {
                let result =
                    collect_from(transport, assigned_worker(job_id, workers), job_id).await?;
                table.record(result)?;
            }

            round += 1;
        }

        Ok(table)
    }
}
