use async_trait::async_trait;
use tracing::info;

use common::{JobId, PeerId, Result, Transport};

use super::{collect_from, dispatch, Policy};
use crate::jobs::JobQueue;
use crate::result_table::ResultTable;

/// Worker that job `job_index` goes to under the static policies.
pub fn assigned_worker(job_index: JobId, workers: usize) -> PeerId {
    (job_index % workers) + 1
}

/// Static batch distribution.
///
/// Every job is sent up front to the worker picked by [`assigned_worker`],
/// without waiting for anything. Results are then collected in the order
/// the jobs were sent. Costs are assumed uniform: a worker that drew
/// expensive jobs finishes late and nothing rebalances it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

#[async_trait]
impl Policy for RoundRobin {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    async fn run(
        &self,
        jobs: &mut JobQueue<'_>,
        workers: usize,
        transport: &mut dyn Transport,
    ) -> Result<ResultTable> {
        let mut table = ResultTable::new(jobs.len());

        while let Some(job) = jobs.pop_job() {
            let worker = assigned_worker(job.id, workers);
            dispatch(transport, worker, job)?;
        }
        info!(
            "Dispatched {} jobs, collecting results",
            jobs.number_of_jobs_processed()
        );

        for job_id in 0..jobs.len() {
            let result = collect_from(transport, assigned_worker(job_id, workers), job_id).await?;
            table.record(result)?;
        }

        Ok(table)
    }
}
