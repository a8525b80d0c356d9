//! Coordinator side of jobfarm: the dispatch policies, the result table,
//! the scheduler that drives a batch to termination, and the gRPC server
//! workers attach to.

pub mod config;
pub mod core;
pub mod jobs;
pub mod policy;
pub mod report;
pub mod result_table;
pub mod scheduler;
pub mod worker_registry;

pub use policy::{Policy, PolicyKind};
pub use result_table::ResultTable;
pub use scheduler::{BatchTimings, Scheduler};
