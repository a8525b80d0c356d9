use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::error::{FarmError, Result};
use crate::transport::Transport;
use crate::mailbox::Delivery;
use crate::{Mailbox, Message, PeerId, Source, Tag, TagFilter};

/// In-process cluster. Every peer gets one unbounded channel as its inbox;
/// a single channel per receiver keeps each sender's messages in order.
pub struct LocalCluster;

impl LocalCluster {
    /// Build `peer_count` connected transports, indexed by rank.
    pub fn new(peer_count: usize) -> Vec<LocalTransport> {
        let (outboxes, mailboxes): (Vec<_>, Vec<_>) = (0..peer_count)
            .map(|_| {
                let (sender, receiver) = mpsc::unbounded_channel();
                (sender, Mailbox::new(receiver))
            })
            .unzip();
        let outboxes = Arc::new(outboxes);

        mailboxes
            .into_iter()
            .enumerate()
            .map(|(rank, mailbox)| LocalTransport {
                rank,
                outboxes: outboxes.clone(),
                mailbox,
            })
            .collect()
    }
}

/// One peer of a [`LocalCluster`].
#[derive(Debug)]
pub struct LocalTransport {
    rank: PeerId,
    outboxes: Arc<Vec<UnboundedSender<Delivery>>>,
    mailbox: Mailbox,
}

#[async_trait]
impl Transport for LocalTransport {
    fn rank(&self) -> PeerId {
        self.rank
    }

    fn peer_count(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> Result<()> {
        let outbox = self
            .outboxes
            .get(dest)
            .ok_or_else(|| FarmError::Protocol(format!("no peer with rank {dest}")))?;
        outbox
            .send(Ok(Message::new(self.rank, tag, body)))
            .map_err(|_| FarmError::Disconnected(dest))
    }

    async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message> {
        self.mailbox.recv(source, tag).await
    }

    async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag> {
        self.mailbox.probe(source, tag).await
    }
}
