//
// Import gRPC stubs/definitions.
//
pub use peer::coordinator_client::CoordinatorClient;
pub use peer::{Envelope, WorkerJoinRequest, WorkerJoinResponse};
pub mod peer {
    tonic::include_proto!("peer");
}

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::{Request, Streaming};
use tracing::{debug, error, info};

use common::{
    Delivery, FarmError, Mailbox, Message, PeerId, Result, Source, Tag, TagFilter, Transport,
    COORDINATOR,
};

/// Metadata entry carrying the worker's rank on `Exchange`.
pub const RANK_METADATA_KEY: &str = "x-peer-rank";

/// Worker end of the exchange stream with the coordinator.
pub struct GrpcTransport {
    rank: PeerId,
    peer_count: usize,
    outbox: mpsc::UnboundedSender<Envelope>,
    mailbox: Mailbox,
}

/// Join the coordinator at `address` and open the exchange stream.
pub async fn join(address: String) -> anyhow::Result<GrpcTransport> {
    let mut client = CoordinatorClient::connect(address).await?;

    let response = client
        .worker_join(Request::new(WorkerJoinRequest {}))
        .await?
        .into_inner();
    let rank = response.rank as PeerId;
    let peer_count = response.peer_count as usize;
    info!("Worker registered (rank={}, peers={})", rank, peer_count);

    let (outbox, outbound) = mpsc::unbounded_channel();
    let mut request = Request::new(UnboundedReceiverStream::new(outbound));
    let rank_value: MetadataValue<Ascii> = rank.to_string().parse()?;
    request.metadata_mut().insert(RANK_METADATA_KEY, rank_value);

    let inbound = client.exchange(request).await?.into_inner();
    let (inbox, receiver) = mpsc::unbounded_channel();
    tokio::spawn(forward_inbound(inbound, inbox));

    Ok(GrpcTransport {
        rank,
        peer_count,
        outbox,
        mailbox: Mailbox::new(receiver),
    })
}

/// Move everything the coordinator sends into the local inbox. A malformed
/// envelope or a failed stream is delivered as an error.
async fn forward_inbound(mut inbound: Streaming<Envelope>, inbox: mpsc::UnboundedSender<Delivery>) {
    loop {
        let delivery = match inbound.message().await {
            Ok(Some(envelope)) => into_message(envelope),
            Ok(None) => break,
            Err(status) => Err(FarmError::Transport(format!(
                "coordinator stream failed: {status}"
            ))),
        };

        let failed = delivery.is_err();
        if let Err(err) = &delivery {
            error!("Stopped reading the coordinator stream: {}", err);
        }
        if inbox.send(delivery).is_err() || failed {
            break;
        }
    }
    debug!("Coordinator stream closed");
}

fn into_message(envelope: Envelope) -> Result<Message> {
    if envelope.source as PeerId != COORDINATOR {
        return Err(FarmError::Protocol(format!(
            "message from rank {} on the coordinator stream",
            envelope.source
        )));
    }
    let tag = Tag::from_wire(envelope.tag)?;
    Ok(Message::new(COORDINATOR, tag, envelope.body))
}

#[async_trait]
impl Transport for GrpcTransport {
    fn rank(&self) -> PeerId {
        self.rank
    }

    fn peer_count(&self) -> usize {
        self.peer_count
    }

    /// Workers only ever talk to the coordinator.
    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> Result<()> {
        if dest != COORDINATOR {
            return Err(FarmError::Protocol(format!(
                "worker {} cannot send to rank {dest}",
                self.rank
            )));
        }

        let envelope = Envelope {
            source: self.rank as u32,
            tag: tag.to_wire(),
            body,
        };
        self.outbox
            .send(envelope)
            .map_err(|_| FarmError::Disconnected(COORDINATOR))
    }

    async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message> {
        self.mailbox.recv(source, tag).await
    }

    async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag> {
        self.mailbox.probe(source, tag).await
    }
}
