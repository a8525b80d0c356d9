use tracing::{debug, info};

use common::{
    FarmError, Job, JobResult, Result, Source, Tag, TagFilter, Transport, COORDINATOR,
};
use workload::Workload;

/// Receive loop of a worker peer.
///
/// Jobs are answered one at a time, in the order they arrive, until the
/// coordinator sends the termination message. Anything else the worker
/// cannot interpret ends the loop with an error; there is no recovery.
pub struct WorkerLoop<T> {
    transport: T,
    workload: Workload,
}

impl<T: Transport> WorkerLoop<T> {
    pub fn new(transport: T, workload: Workload) -> Self {
        Self {
            transport,
            workload,
        }
    }

    /// Run until terminated. Returns how many jobs this worker answered.
    pub async fn run(mut self) -> Result<usize> {
        let rank = self.transport.rank();
        let mut processed = 0;

        loop {
            let tag = self
                .transport
                .probe(Source::Peer(COORDINATOR), TagFilter::Any)
                .await?;

            match tag {
                Tag::Job => {
                    self.answer_next_job().await?;
                    processed += 1;
                }
                Tag::Terminate => {
                    self.transport
                        .recv(Source::Peer(COORDINATOR), TagFilter::Only(Tag::Terminate))
                        .await?;
                    info!("Worker {} terminated after {} jobs", rank, processed);
                    return Ok(processed);
                }
                Tag::Result => {
                    return Err(FarmError::Protocol(format!(
                        "worker {rank} cannot interpret a {tag} message"
                    )));
                }
            }
        }
    }

    async fn answer_next_job(&mut self) -> Result<()> {
        let message = self
            .transport
            .recv(Source::Peer(COORDINATOR), TagFilter::Only(Tag::Job))
            .await?;
        let job = Job::from_body(message.body)?;

        let value = self.workload.reduce(&job.payload).map_err(|err| {
            FarmError::Protocol(format!("job {} cannot be reduced: {err}", job.id))
        })?;
        debug!(
            "Worker {} reduced job {} ({} elements)",
            self.transport.rank(),
            job.id,
            job.payload.len()
        );

        // Fire and forget: the coordinator may still be busy dispatching.
        self.transport
            .send(COORDINATOR, Tag::Result, JobResult::new(job.id, value).into_body())
    }
}
