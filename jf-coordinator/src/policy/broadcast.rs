use async_trait::async_trait;
use tracing::debug;

use common::{FarmError, Job, JobResult, Result, Transport};
use workload::Workload;

use super::{collect_from, dispatch, Policy};
use crate::jobs::JobQueue;
use crate::result_table::ResultTable;

/// Domain decomposition with a barrier after every job.
///
/// Each job's payload is cut into `workers` equal contiguous slices, slice
/// `w - 1` going to worker `w`. The coordinator waits for every partial
/// result of the job and merges them with the workload's combine function
/// before it touches the next job, so work on two jobs never overlaps.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastBarrier {
    workload: Workload,
}

impl BroadcastBarrier {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

#[async_trait]
impl Policy for BroadcastBarrier {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn run(
        &self,
        jobs: &mut JobQueue<'_>,
        workers: usize,
        transport: &mut dyn Transport,
    ) -> Result<ResultTable> {
        let elements = jobs.source().elements_per_job();
        if elements == 0 || elements % workers != 0 {
            return Err(FarmError::Config(format!(
                "{elements} elements per job cannot be split evenly across {workers} workers"
            )));
        }
        let slice_len = elements / workers;

        let mut table = ResultTable::new(jobs.len());

        while let Some(job) = jobs.pop_job() {
            let job_id = job.id;
            for (index, slice) in job.payload.chunks(slice_len).enumerate() {
                dispatch(transport, index + 1, Job::new(job_id, slice.to_vec()))?;
            }

            let mut merged: Option<i64> = None;
            for worker in 1..=workers {
                let partial = collect_from(transport, worker, job_id).await?;
                merged = Some(match merged {
                    Some(value) => self.workload.combine(value, partial.value),
                    None => partial.value,
                });
            }

            if let Some(value) = merged {
                debug!("Job {} merged from {} partial results", job_id, workers);
                table.record(JobResult::new(job_id, value))?;
            }
        }

        Ok(table)
    }
}
