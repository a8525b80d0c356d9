use std::collections::VecDeque;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::trace;

use crate::error::{FarmError, Result};
use crate::{Message, Source, Tag, TagFilter};

/// What a transport pushes into a peer's inbox: a message, or the reason
/// the link that carried it broke.
pub type Delivery = Result<Message>;

/// Receive side of a peer.
///
/// Incoming messages arrive on one channel in delivery order. A delivered
/// error fails the receive that reads it. A receive
/// that does not want the head of the channel parks the skipped messages
/// in `pending`, which is always searched first, so a later receive still
/// sees each sender's messages in the order they were sent.
#[derive(Debug)]
pub struct Mailbox {
    inbox: UnboundedReceiver<Delivery>,
    pending: VecDeque<Message>,
}

impl Mailbox {
    pub fn new(inbox: UnboundedReceiver<Delivery>) -> Self {
        Self {
            inbox,
            pending: VecDeque::new(),
        }
    }

    /// Number of delivered messages no receive has matched yet.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message> {
        if let Some(position) = self.find_pending(source, tag) {
            if let Some(message) = self.pending.remove(position) {
                return Ok(message);
            }
        }

        loop {
            let message = self.next_delivered().await?;
            if message.matches(source, tag) {
                return Ok(message);
            }
            self.park(message);
        }
    }

    pub async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag> {
        if let Some(position) = self.find_pending(source, tag) {
            return Ok(self.pending[position].tag);
        }

        loop {
            let message = self.next_delivered().await?;
            let matched = message.matches(source, tag);
            let found = message.tag;
            self.park(message);
            if matched {
                return Ok(found);
            }
        }
    }

    fn find_pending(&self, source: Source, tag: TagFilter) -> Option<usize> {
        self.pending
            .iter()
            .position(|message| message.matches(source, tag))
    }

    async fn next_delivered(&mut self) -> Result<Message> {
        match self.inbox.recv().await {
            Some(delivery) => delivery,
            None => Err(FarmError::Closed),
        }
    }

    fn park(&mut self, message: Message) {
        trace!(
            "Parking {} message from peer {} ({} pending)",
            message.tag,
            message.source,
            self.pending.len() + 1
        );
        self.pending.push_back(message);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn mailbox_with(messages: Vec<Message>) -> Mailbox {
        let (sender, receiver) = mpsc::unbounded_channel();
        for message in messages {
            sender.send(Ok(message)).unwrap();
        }
        Mailbox::new(receiver)
    }

    #[tokio::test]
    async fn skipped_messages_wait_in_order() {
        let mut mailbox = mailbox_with(vec![
            Message::new(1, Tag::Result, vec![10, 0]),
            Message::new(2, Tag::Result, vec![20, 1]),
            Message::new(1, Tag::Result, vec![30, 2]),
        ]);

        let from_two = mailbox.recv(Source::Peer(2), TagFilter::Any).await.unwrap();
        assert_eq!(from_two.body, vec![20, 1]);
        assert_eq!(mailbox.pending_len(), 1);

        let first = mailbox.recv(Source::Peer(1), TagFilter::Any).await.unwrap();
        let second = mailbox.recv(Source::Peer(1), TagFilter::Any).await.unwrap();
        assert_eq!(first.body, vec![10, 0]);
        assert_eq!(second.body, vec![30, 2]);
        assert_eq!(mailbox.pending_len(), 0);
    }

    #[tokio::test]
    async fn probe_does_not_consume() {
        let mut mailbox = mailbox_with(vec![
            Message::new(0, Tag::Job, vec![0, 5]),
            Message::new(0, Tag::Terminate, vec![]),
        ]);

        let tag = mailbox.probe(Source::Peer(0), TagFilter::Any).await.unwrap();
        assert_eq!(tag, Tag::Job);
        // Probing twice sees the same head.
        let tag = mailbox.probe(Source::Peer(0), TagFilter::Any).await.unwrap();
        assert_eq!(tag, Tag::Job);

        let job = mailbox.recv(Source::Peer(0), TagFilter::Only(Tag::Job)).await.unwrap();
        assert_eq!(job.body, vec![0, 5]);

        let tag = mailbox.probe(Source::Any, TagFilter::Any).await.unwrap();
        assert_eq!(tag, Tag::Terminate);
    }

    #[tokio::test]
    async fn closed_inbox_is_an_error() {
        let (sender, receiver) = mpsc::unbounded_channel::<Delivery>();
        drop(sender);
        let mut mailbox = Mailbox::new(receiver);

        let err = mailbox.recv(Source::Any, TagFilter::Any).await.unwrap_err();
        assert!(matches!(err, FarmError::Closed));
    }

    #[tokio::test]
    async fn delivered_error_fails_the_receive() {
        let (sender, receiver) = mpsc::unbounded_channel();
        sender.send(Ok(Message::new(1, Tag::Result, vec![4, 0]))).unwrap();
        sender
            .send(Err(FarmError::Protocol("unknown message tag 9".into())))
            .unwrap();
        let mut mailbox = Mailbox::new(receiver);

        // The message ahead of the error is still delivered.
        let message = mailbox.recv(Source::Peer(1), TagFilter::Any).await.unwrap();
        assert_eq!(message.body, vec![4, 0]);

        let err = mailbox.recv(Source::Any, TagFilter::Any).await.unwrap_err();
        assert!(matches!(err, FarmError::Protocol(_)));
    }
}
