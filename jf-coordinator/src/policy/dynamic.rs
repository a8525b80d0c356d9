use async_trait::async_trait;
use tracing::{debug, info};

use common::{JobResult, PeerId, Result, Source, Tag, TagFilter, Transport};

use super::{dispatch, Policy};
use crate::jobs::JobQueue;
use crate::result_table::ResultTable;
use crate::worker_registry::WorkerRegistry;

/// Greedy assignment by availability.
///
/// Each job goes to the lowest ranked idle worker. When none is idle the
/// coordinator waits for any worker to finish, records that result and
/// hands the job to the worker that just freed up. Workers that finish
/// early get more work, so the makespan follows the actual job costs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicGreedy;

/// Wait for the next result from any worker, record it and mark its
/// sender idle. Returns the sender.
async fn drain_one(
    transport: &mut dyn Transport,
    registry: &mut WorkerRegistry,
    table: &mut ResultTable,
) -> Result<PeerId> {
    let message = transport
        .recv(Source::Any, TagFilter::Only(Tag::Result))
        .await?;
    let result = JobResult::from_body(&message.body)?;

    registry.release(message.source)?;
    table.record(result)?;

    debug!("Worker {} finished job {}", message.source, result.job_id);
    Ok(message.source)
}

#[async_trait]
impl Policy for DynamicGreedy {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    async fn run(
        &self,
        jobs: &mut JobQueue<'_>,
        workers: usize,
        transport: &mut dyn Transport,
    ) -> Result<ResultTable> {
        let mut table = ResultTable::new(jobs.len());
        let mut registry = WorkerRegistry::new(workers);

        while let Some(job) = jobs.pop_job() {
            let worker = match registry.first_idle() {
                Some(worker) => worker,
                None => drain_one(transport, &mut registry, &mut table).await?,
            };
            registry.assign(worker)?;
            dispatch(transport, worker, job)?;
        }

        let outstanding = jobs.len() - table.len();
        info!(
            "All jobs dispatched, draining {} outstanding results",
            outstanding
        );
        for _ in 0..outstanding {
            drain_one(transport, &mut registry, &mut table).await?;
        }

        Ok(table)
    }
}
