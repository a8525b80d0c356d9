use async_trait::async_trait;

use crate::error::Result;
use crate::{Message, PeerId, Source, Tag, TagFilter};

/// Point-to-point message passing between numbered peers.
///
/// Implementations must deliver the messages one peer sends to another in
/// send order. Messages from different senders may interleave freely.
#[async_trait]
pub trait Transport: Send {
    /// Rank of the local peer.
    fn rank(&self) -> PeerId;

    /// Number of peers, coordinator included.
    fn peer_count(&self) -> usize;

    /// Queue `body` for `dest` and return without waiting for the receiver.
    fn send(&self, dest: PeerId, tag: Tag, body: Vec<i64>) -> Result<()>;

    /// Block until a message matching `source` and `tag` is available and
    /// consume it. Messages that do not match stay queued in arrival order.
    async fn recv(&mut self, source: Source, tag: TagFilter) -> Result<Message>;

    /// Block until a message matching `source` and `tag` is available and
    /// return its tag without consuming it.
    async fn probe(&mut self, source: Source, tag: TagFilter) -> Result<Tag>;
}
