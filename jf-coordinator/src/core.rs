//! gRPC side of the coordinator.
//!
//! Workers call `WorkerJoin` to get a rank, then open one `Exchange`
//! stream each. Once all of them are attached, the server hands a
//! [`GrpcTransport`] over to whoever is waiting in
//! [`PeerServer::wait_for_workers`].

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{TcpListenerStream, UnboundedReceiverStream};
use tokio_stream::Stream;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info};

use common::{
    Delivery, FarmError, Mailbox, Message, PeerId, Source, Tag, TagFilter, Transport, COORDINATOR,
};

pub use peer::coordinator_server::{Coordinator, CoordinatorServer};
use peer::{Envelope, WorkerJoinRequest, WorkerJoinResponse};
pub mod peer {
    tonic::include_proto!("peer");
}

/// Metadata entry carrying the worker's rank on `Exchange`.
pub const RANK_METADATA_KEY: &str = "x-peer-rank";

type EnvelopeSender = mpsc::UnboundedSender<Result<Envelope, Status>>;

/// Workers known to the server, indexed by rank - 1.
struct WorkerRoster {
    workers: usize,

    /// Ranks handed out so far.
    joined: usize,

    /// Outbound half of every attached exchange stream.
    outboxes: Vec<Option<EnvelopeSender>>,

    attached: usize,

    /// Where every inbound stream delivers.
    inbox: mpsc::UnboundedSender<Delivery>,

    /// Receive side and the waiter, until every worker is attached.
    handover: Option<(Mailbox, oneshot::Sender<GrpcTransport>)>,
}

impl WorkerRoster {
    fn attach(&mut self, rank: PeerId, outbox: EnvelopeSender) -> Result<(), Status> {
        if rank == COORDINATOR || rank > self.joined {
            return Err(Status::permission_denied(format!(
                "rank {rank} was never handed out"
            )));
        }

        let slot = &mut self.outboxes[rank - 1];
        if slot.is_some() {
            return Err(Status::already_exists(format!(
                "rank {rank} already has an exchange stream"
            )));
        }
        *slot = Some(outbox);
        self.attached += 1;
        info!("Worker {} attached ({}/{})", rank, self.attached, self.workers);

        if self.attached == self.workers {
            self.hand_over();
        }
        Ok(())
    }

    fn hand_over(&mut self) {
        let Some((mailbox, waiter)) = self.handover.take() else {
            return;
        };
        let outboxes = self.outboxes.iter_mut().filter_map(Option::take).collect();

        if waiter.send(GrpcTransport { outboxes, mailbox }).is_err() {
            error!("Nobody is waiting for the workers anymore");
        }
    }
}

/// The `Coordinator` gRPC service.
pub struct JfCoordinator {
    roster: Arc<Mutex<WorkerRoster>>,
}

impl JfCoordinator {
    /// Service accepting exactly `workers` workers. The receiver resolves
    /// once all of them are attached.
    pub fn new(workers: usize) -> (Self, oneshot::Receiver<GrpcTransport>) {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let (waiter, ready) = oneshot::channel();

        let roster = WorkerRoster {
            workers,
            joined: 0,
            outboxes: (0..workers).map(|_| None).collect(),
            attached: 0,
            inbox,
            handover: Some((Mailbox::new(receiver), waiter)),
        };

        let service = Self {
            roster: Arc::new(Mutex::new(roster)),
        };
        (service, ready)
    }
}

#[tonic::async_trait]
impl Coordinator for JfCoordinator {
    /// Worker requests to join the workforce.
    async fn worker_join(
        &self,
        request: Request<WorkerJoinRequest>,
    ) -> Result<Response<WorkerJoinResponse>, Status> {
        let mut roster = self.roster.lock().await;
        if roster.joined == roster.workers {
            return Err(Status::resource_exhausted(format!(
                "all {} worker slots are taken",
                roster.workers
            )));
        }

        roster.joined += 1;
        let rank = roster.joined;
        info!("Worker joined from {:?} (rank={})", request.remote_addr(), rank);

        let reply = WorkerJoinResponse {
            rank: rank as u32,
            peer_count: (roster.workers + 1) as u32,
        };
        Ok(Response::new(reply))
    }

    type ExchangeStream = Pin<Box<dyn Stream<Item = Result<Envelope, Status>> + Send + 'static>>;

    async fn exchange(
        &self,
        request: Request<Streaming<Envelope>>,
    ) -> Result<Response<Self::ExchangeStream>, Status> {
        let rank = rank_from_metadata(&request)?;
        let (outbox, outbound) = mpsc::unbounded_channel();

        let inbox = {
            let mut roster = self.roster.lock().await;
            roster.attach(rank, outbox)?;
            roster.inbox.clone()
        };

        let inbound = request.into_inner();
        tokio::spawn(forward_inbound(rank, inbound, inbox));

        Ok(Response::new(Box::pin(UnboundedReceiverStream::new(outbound))))
    }
}

fn rank_from_metadata<T>(request: &Request<T>) -> Result<PeerId, Status> {
    request
        .metadata()
        .get(RANK_METADATA_KEY)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<PeerId>().ok())
        .ok_or_else(|| Status::invalid_argument(format!("missing or malformed {RANK_METADATA_KEY}")))
}

/// Move everything `rank` sends into the coordinator's inbox. A malformed
/// envelope or a broken stream is delivered as an error, which fails
/// whichever receive reads it.
async fn forward_inbound(
    rank: PeerId,
    mut inbound: Streaming<Envelope>,
    inbox: mpsc::UnboundedSender<Delivery>,
) {
    loop {
        let delivery = match inbound.message().await {
            Ok(Some(envelope)) => into_message(rank, envelope),
            Ok(None) => {
                debug!("Worker {} closed its stream", rank);
                Err(FarmError::Disconnected(rank))
            }
            Err(status) => Err(FarmError::Transport(format!(
                "stream of worker {rank} failed: {status}"
            ))),
        };

        let failed = delivery.is_err();
        if let Err(err) = &delivery {
            error!("Stopped reading worker {}: {}", rank, err);
        }
        if inbox.send(delivery).is_err() || failed {
            break;
        }
    }
}

fn into_message(rank: PeerId, envelope: Envelope) -> common::Result<Message> {
    if envelope.source as PeerId != rank {
        return Err(FarmError::Protocol(format!(
            "worker {rank} sent a message claiming to be from {}",
            envelope.source
        )));
    }
    let tag = Tag::from_wire(envelope.tag)?;
    Ok(Message::new(rank, tag, envelope.body))
}

/// Coordinator end of every worker's exchange stream.
pub struct GrpcTransport {
    outboxes: Vec<EnvelopeSender>,
    mailbox: Mailbox,
}

#[async_trait]
impl Transport for GrpcTransport {
    fn rank(&self) -> PeerId {
        COORDINATOR
    }

    fn peer_count(&self) -> usize {
        self.outboxes.len() + 1
    }

    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> common::Result<()> {
        let outbox = dest
            .checked_sub(1)
            .and_then(|index| self.outboxes.get(index))
            .ok_or_else(|| FarmError::Protocol(format!("no worker with rank {dest}")))?;

        let envelope = Envelope {
            source: COORDINATOR as u32,
            tag: tag.to_wire(),
            body,
        };
        outbox
            .send(Ok(envelope))
            .map_err(|_| FarmError::Disconnected(dest))
    }

    async fn recv(&mut self, source: Source, tag: TagFilter) -> common::Result<Message> {
        self.mailbox.recv(source, tag).await
    }

    async fn probe(&mut self, source: Source, tag: TagFilter) -> common::Result<Tag> {
        self.mailbox.probe(source, tag).await
    }
}

/// A running coordinator server.
pub struct PeerServer {
    ready: oneshot::Receiver<GrpcTransport>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl PeerServer {
    /// Serve on `listener`, accepting exactly `workers` workers.
    pub fn spawn(listener: TcpListener, workers: usize) -> Self {
        let (coordinator, ready) = JfCoordinator::new(workers);
        let (shutdown, signal) = oneshot::channel::<()>();

        let server = tokio::spawn(
            Server::builder()
                .add_service(CoordinatorServer::new(coordinator))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = signal.await;
                }),
        );

        Self {
            ready,
            shutdown,
            server,
        }
    }

    /// Block until every worker has joined and opened its stream.
    pub async fn wait_for_workers(&mut self) -> common::Result<GrpcTransport> {
        (&mut self.ready).await.map_err(|_| {
            FarmError::Transport("server stopped before every worker attached".into())
        })
    }

    /// Stop accepting connections and wait for open streams to finish.
    /// Drop the transport first so the workers' streams can end.
    pub async fn shutdown(self) -> common::Result<()> {
        let _ = self.shutdown.send(());
        match self.server.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(FarmError::Transport(err.to_string())),
            Err(err) => Err(FarmError::Transport(err.to_string())),
        }
    }
}
