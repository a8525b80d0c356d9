use tracing::info;

mod args;
use args::Args;

use common::cli::{exit_with_usage, parse_or_exit};
use common::Transport;
use jf_worker::{core, WorkerLoop};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Args = parse_or_exit();
    let workload = match args.workload() {
        Ok(workload) => workload,
        Err(err) => exit_with_usage::<Args>(&err),
    };

    let transport = core::join(args.address).await?;
    let rank = transport.rank();

    let processed = WorkerLoop::new(transport, workload).run().await?;
    info!("Worker {} exited after {} jobs", rank, processed);

    Ok(())
}
