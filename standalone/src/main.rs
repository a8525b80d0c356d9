//! Runs the coordinator and every worker in one process, each peer on its
//! own task, connected by in-process channels.

use clap::Parser;
use tracing::info;

use common::LocalCluster;
use jf_coordinator::config::{exit_with_usage, parse_or_exit, RunArgs};
use jf_coordinator::report::Report;
use jf_coordinator::Scheduler;
use jf_worker::WorkerLoop;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    run: RunArgs,

    /// Number of worker peers (the coordinator comes on top).
    #[arg(short, long, default_value = "4")]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Args = parse_or_exit();
    let config = match args.run.validate(args.workers) {
        Ok(config) => config,
        Err(err) => exit_with_usage::<Args>(&err),
    };

    let mut peers = LocalCluster::new(config.workers + 1);
    let mut coordinator = peers.remove(0);

    let workers = peers
        .into_iter()
        .map(|transport| tokio::spawn(WorkerLoop::new(transport, config.workload).run()))
        .collect::<Vec<_>>();

    let scheduler = Scheduler::new(config.policy.build(config.workload));
    let (table, timings) = scheduler.run_timed(&config.source, &mut coordinator).await?;

    for (index, worker) in workers.into_iter().enumerate() {
        let processed = worker.await??;
        info!("Worker {} answered {} jobs", index + 1, processed);
    }

    let policy = config.policy.to_string();
    let report = Report::new(&table, &config.workload, &policy, config.workers, timings);
    print!("{}", report.render(config.format)?);

    Ok(())
}
