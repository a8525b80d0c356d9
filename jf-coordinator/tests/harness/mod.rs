//! Test harness: an in-process cluster whose coordinator transport
//! records every message it sends.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use common::{JobId, LocalCluster, LocalTransport, Message, PeerId, Result, Source, Tag, TagFilter, Transport};
use jf_coordinator::{PolicyKind, ResultTable, Scheduler};
use jf_worker::WorkerLoop;
use workload::JobSource;

pub const DEADLINE: Duration = Duration::from_secs(10);

/// One message the coordinator sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sent {
    pub dest: PeerId,
    pub tag: Tag,
    /// Leading job id of a job body.
    pub job_id: Option<JobId>,
    /// Number of payload elements of a job body.
    pub len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Log {
    pub sent: Vec<Sent>,

    /// Jobs sent to each worker and not answered yet, indexed by rank - 1.
    in_flight: Vec<usize>,

    /// Highest value `in_flight` reached per worker.
    pub max_in_flight: Vec<usize>,

    /// Highest number of unanswered jobs across all workers.
    pub max_total_in_flight: usize,
}

impl Log {
    fn new(workers: usize) -> Self {
        Self {
            sent: Vec::new(),
            in_flight: vec![0; workers],
            max_in_flight: vec![0; workers],
            max_total_in_flight: 0,
        }
    }

    /// Job ids sent to `worker`, in send order.
    pub fn jobs_sent_to(&self, worker: PeerId) -> Vec<JobId> {
        self.sent
            .iter()
            .filter(|sent| sent.dest == worker && sent.tag == Tag::Job)
            .filter_map(|sent| sent.job_id)
            .collect()
    }

    /// `(job id, worker)` for every job message, in send order.
    pub fn assignment(&self) -> Vec<(JobId, PeerId)> {
        self.sent
            .iter()
            .filter(|sent| sent.tag == Tag::Job)
            .filter_map(|sent| sent.job_id.map(|job_id| (job_id, sent.dest)))
            .collect()
    }

    pub fn terminations_sent_to(&self, worker: PeerId) -> usize {
        self.sent
            .iter()
            .filter(|sent| sent.dest == worker && sent.tag == Tag::Terminate)
            .count()
    }

    pub fn last_sent_to(&self, worker: PeerId) -> Option<Sent> {
        self.sent.iter().filter(|sent| sent.dest == worker).last().copied()
    }
}

/// Coordinator transport that logs what goes through it.
pub struct RecordingTransport<T> {
    inner: T,
    log: Arc<Mutex<Log>>,
}

impl<T: Transport> RecordingTransport<T> {
    pub fn new(inner: T) -> (Self, Arc<Mutex<Log>>) {
        let workers = inner.peer_count().saturating_sub(1);
        let log = Arc::new(Mutex::new(Log::new(workers)));
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

#[async_trait]
impl<T: Transport> Transport for RecordingTransport<T> {
    fn rank(&self) -> PeerId {
        self.inner.rank()
    }

    fn peer_count(&self) -> usize {
        self.inner.peer_count()
    }

    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> Result<()> {
        {
            let mut log = self.log.lock().unwrap();
            let (job_id, len) = match tag {
                Tag::Job => (body.first().map(|id| *id as JobId), body.len().saturating_sub(1)),
                _ => (None, body.len()),
            };
            log.sent.push(Sent {
                dest,
                tag,
                job_id,
                len,
            });

            if tag == Tag::Job && dest >= 1 && dest <= log.in_flight.len() {
                log.in_flight[dest - 1] += 1;
                let current = log.in_flight[dest - 1];
                let peak = &mut log.max_in_flight[dest - 1];
                *peak = (*peak).max(current);
                let total = log.in_flight.iter().sum::<usize>();
                log.max_total_in_flight = log.max_total_in_flight.max(total);
            }
        }
        self.inner.send(dest, tag, body)
    }

    async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message> {
        let message = self.inner.recv(source, tag).await?;
        if message.tag == Tag::Result && message.source >= 1 {
            let mut log = self.log.lock().unwrap();
            if let Some(count) = log.in_flight.get_mut(message.source - 1) {
                *count = count.saturating_sub(1);
            }
        }
        Ok(message)
    }

    async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag> {
        self.inner.probe(source, tag).await
    }
}

/// Worker transport that stalls before handing out every job, making its
/// worker slow.
pub struct SlowTransport<T> {
    inner: T,
    delay: Duration,
}

impl<T> SlowTransport<T> {
    pub fn new(inner: T, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<T: Transport> Transport for SlowTransport<T> {
    fn rank(&self) -> PeerId {
        self.inner.rank()
    }

    fn peer_count(&self) -> usize {
        self.inner.peer_count()
    }

    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> Result<()> {
        self.inner.send(dest, tag, body)
    }

    async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message> {
        let message = self.inner.recv(source, tag).await?;
        if message.tag == Tag::Job {
            tokio::time::sleep(self.delay).await;
        }
        Ok(message)
    }

    async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag> {
        self.inner.probe(source, tag).await
    }
}

/// What a finished batch left behind.
pub struct Outcome {
    pub table: ResultTable,
    pub log: Log,
    /// Jobs answered by each worker, indexed by rank - 1.
    pub processed: Vec<usize>,
}

/// Run a batch over an in-process cluster with `workers` workers running
/// the real worker loop.
pub async fn run_batch(policy: PolicyKind, source: JobSource, workers: usize) -> Outcome {
    run_batch_with(policy, "max", source, workers, Duration::ZERO).await
}

/// Like [`run_batch`], with a workload name and a delay that slows down
/// worker 1 only.
pub async fn run_batch_with(
    policy: PolicyKind,
    workload: &str,
    source: JobSource,
    workers: usize,
    first_worker_delay: Duration,
) -> Outcome {
    let workload = workload::try_named(workload).expect("known workload");
    let mut peers = LocalCluster::new(workers + 1);
    let coordinator = peers.remove(0);

    let handles = peers
        .into_iter()
        .map(|transport| {
            if transport.rank() == 1 && !first_worker_delay.is_zero() {
                let slow = SlowTransport::new(transport, first_worker_delay);
                tokio::spawn(WorkerLoop::new(slow, workload).run())
            } else {
                tokio::spawn(WorkerLoop::new(transport, workload).run())
            }
        })
        .collect::<Vec<_>>();

    let (mut transport, log) = RecordingTransport::new(coordinator);
    let scheduler = Scheduler::new(policy.build(workload));
    let table = timeout(DEADLINE, scheduler.run(&source, &mut transport))
        .await
        .expect("batch timed out")
        .expect("batch failed");

    let mut processed = Vec::new();
    for handle in handles {
        let count = timeout(DEADLINE, handle)
            .await
            .expect("worker did not terminate")
            .expect("worker panicked")
            .expect("worker failed");
        processed.push(count);
    }

    let log = log.lock().unwrap().clone();
    Outcome {
        table,
        log,
        processed,
    }
}

/// Expected result of every job of `source` under `workload`.
pub fn expected(source: &JobSource, workload: &str) -> Vec<i64> {
    let workload = workload::try_named(workload).expect("known workload");
    source
        .jobs()
        .map(|job| workload.reduce(&job.payload).unwrap())
        .collect()
}

/// Coordinator and bare worker transports, for tests that play the
/// worker side by hand.
pub fn bare_cluster(workers: usize) -> (LocalTransport, Vec<LocalTransport>) {
    let mut peers = LocalCluster::new(workers + 1);
    let coordinator = peers.remove(0);
    (coordinator, peers)
}

pub const ALL_POLICIES: [PolicyKind; 4] = [
    PolicyKind::Broadcast,
    PolicyKind::RoundRobin,
    PolicyKind::PerRound,
    PolicyKind::Dynamic,
];
