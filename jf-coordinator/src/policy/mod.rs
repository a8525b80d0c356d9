//! Dispatch policies.
//!
//! A policy decides which worker gets which job and when the coordinator
//! stops to wait for results. All of them hand back one result per job;
//! termination is left to the [`Scheduler`](crate::scheduler::Scheduler).

use std::fmt;

use async_trait::async_trait;
use clap::ValueEnum;
use tracing::debug;

use common::{FarmError, Job, JobId, JobResult, PeerId, Result, Source, Tag, TagFilter, Transport};
use workload::Workload;

use crate::jobs::JobQueue;
use crate::result_table::ResultTable;

mod broadcast;
mod dynamic;
mod per_round;
mod round_robin;

pub use broadcast::BroadcastBarrier;
pub use dynamic::DynamicGreedy;
pub use per_round::PerRound;
pub use round_robin::{assigned_worker, RoundRobin};

/// A complete strategy for assigning jobs to workers.
#[async_trait]
pub trait Policy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Dispatch every job of `jobs` to the `workers` worker peers (ranks
    /// 1..=workers) and collect one result per job.
    async fn run(
        &self,
        jobs: &mut JobQueue<'_>,
        workers: usize,
        transport: &mut dyn Transport,
    ) -> Result<ResultTable>;
}

/// Selectable policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Split every job across all workers and wait for it before the next.
    Broadcast,
    /// Send every job up front, job i to worker (i mod W) + 1.
    RoundRobin,
    /// Round robin, one round of W jobs at a time.
    PerRound,
    /// Hand each job to the first idle worker.
    Dynamic,
}

impl PolicyKind {
    /// Build the policy. The workload is only consulted by the broadcast
    /// policy, to merge partial results.
    pub fn build(self, workload: Workload) -> Box<dyn Policy> {
        match self {
            PolicyKind::Broadcast => Box::new(BroadcastBarrier::new(workload)),
            PolicyKind::RoundRobin => Box::new(RoundRobin),
            PolicyKind::PerRound => Box::new(PerRound),
            PolicyKind::Dynamic => Box::new(DynamicGreedy),
        }
    }

    /// Whether every job payload must split evenly across the workers.
    pub fn requires_even_partition(self) -> bool {
        matches!(self, PolicyKind::Broadcast)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Broadcast => "broadcast",
            PolicyKind::RoundRobin => "round-robin",
            PolicyKind::PerRound => "per-round",
            PolicyKind::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

/// Hand `job` to `worker`. The payload buffer moves into the transport.
fn dispatch(transport: &dyn Transport, worker: PeerId, job: Job) -> Result<()> {
    debug!("Dispatching job {} to worker {}", job.id, worker);
    transport.send(worker, Tag::Job, job.into_body())
}

/// Wait for the next result from `worker`, which must be for `job_id`.
///
/// A worker answers its jobs one at a time and the transport keeps each
/// sender's messages in order, so the static policies know which job the
/// next result from a given worker belongs to.
async fn collect_from(
    transport: &mut dyn Transport,
    worker: PeerId,
    job_id: JobId,
) -> Result<JobResult> {
    let message = transport
        .recv(Source::Peer(worker), TagFilter::Only(Tag::Result))
        .await?;
    let result = JobResult::from_body(&message.body)?;

    if result.job_id != job_id {
        return Err(FarmError::Protocol(format!(
            "worker {worker} answered job {} while job {job_id} was expected",
            result.job_id
        )));
    }

    debug!("Worker {} finished job {}", worker, job_id);
    Ok(result)
}
