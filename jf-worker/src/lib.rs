//! Worker side of jobfarm: the receive loop every worker peer runs, and
//! the gRPC client it uses to reach the coordinator.

pub mod core;
pub mod worker_loop;

pub use worker_loop::WorkerLoop;
