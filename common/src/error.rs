use thiserror::Error;

use crate::{JobId, PeerId};

/// Errors shared by the coordinator and the workers.
///
/// Every variant is fatal: the peers form a closed, trusted set and there
/// is no retry layer anywhere in the protocol.
#[derive(Error, Debug)]
pub enum FarmError {
    /// Bad arguments, detected before anything is dispatched.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A peer sent something the protocol does not allow.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Result for unknown job {0}")]
    UnknownJob(JobId),

    #[error("Duplicate result for job {0}")]
    DuplicateResult(JobId),

    #[error("Peer {0} is no longer reachable")]
    Disconnected(PeerId),

    #[error("Inbox closed while waiting for a message")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, FarmError>;
