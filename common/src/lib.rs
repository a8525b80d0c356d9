//! Shared plumbing for the jobfarm coordinator and workers.
//!
//! A batch of equal-shape jobs is handed out by one coordinator peer
//! (rank 0) to a fixed pool of worker peers (ranks 1..=W). Everything the
//! two sides must agree on lives here: message tags, the wire layout of
//! jobs and results, and the [`Transport`] seam both sides talk through.

use std::fmt;

pub mod cli;
pub mod codec;
pub mod error;
pub mod local;
pub mod mailbox;
pub mod transport;

pub use codec::{Job, JobResult};
pub use error::{FarmError, Result};
pub use local::{LocalCluster, LocalTransport};
pub use mailbox::{Delivery, Mailbox};
pub use transport::Transport;

/////////////////////////////////////////////////////////////////////////////
// Peers
/////////////////////////////////////////////////////////////////////////////

/// Rank of a peer. The coordinator is always rank 0.
pub type PeerId = usize;

/// Index of a job within its batch, assigned in creation order.
pub type JobId = usize;

/// Rank of the coordinator peer.
pub const COORDINATOR: PeerId = 0;

/////////////////////////////////////////////////////////////////////////////
// Messages
/////////////////////////////////////////////////////////////////////////////

/// Kind of a message. Jobs and termination are told apart by tag only,
/// never by the length of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Coordinator to worker: `[jobId] ++ payload`.
    Job,

    /// Worker to coordinator: `[value, jobId]`.
    Result,

    /// Coordinator to worker, empty body. Always the last message a
    /// worker receives.
    Terminate,
}

impl Tag {
    /// Numeric value used on the wire.
    pub fn to_wire(self) -> u32 {
        match self {
            Tag::Job => 0,
            Tag::Result => 1,
            Tag::Terminate => 2,
        }
    }

    pub fn from_wire(value: u32) -> Result<Tag> {
        match value {
            0 => Ok(Tag::Job),
            1 => Ok(Tag::Result),
            2 => Ok(Tag::Terminate),
            other => Err(FarmError::Protocol(format!("unknown message tag {other}"))),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Job => "job",
            Tag::Result => "result",
            Tag::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// Which sender a receive is willing to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Any,
    Peer(PeerId),
}

/// Which tag a receive is willing to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFilter {
    Any,
    Only(Tag),
}

/// A message as delivered to the receiving peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Rank of the sender.
    pub source: PeerId,

    pub tag: Tag,

    pub body: Vec<i64>,
}

impl Message {
    pub fn new(source: PeerId, tag: Tag, body: Vec<i64>) -> Self {
        Self { source, tag, body }
    }

    /// Whether this message satisfies a receive posted with `source` and `tag`.
    pub fn matches(&self, source: Source, tag: TagFilter) -> bool {
        let source_ok = match source {
            Source::Any => true,
            Source::Peer(peer) => self.source == peer,
        };
        let tag_ok = match tag {
            TagFilter::Any => true,
            TagFilter::Only(wanted) => self.tag == wanted,
        };
        source_ok && tag_ok
    }
}
