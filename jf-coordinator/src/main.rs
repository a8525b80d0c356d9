mod args;

use args::Args;

use tokio::net::TcpListener;
use tracing::info;

use jf_coordinator::config::{exit_with_usage, parse_or_exit};
use jf_coordinator::core::PeerServer;
use jf_coordinator::report::Report;
use jf_coordinator::Scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Args = parse_or_exit();
    let config = match args.run.validate(args.workers) {
        Ok(config) => config,
        Err(err) => exit_with_usage::<Args>(&err),
    };

    let listener = TcpListener::bind(format!("[::1]:{}", args.port)).await?;
    info!("CoordinatorServer listening on {}", listener.local_addr()?);

    let mut server = PeerServer::spawn(listener, config.workers);
    let mut transport = server.wait_for_workers().await?;
    info!("All {} workers attached", config.workers);

    let scheduler = Scheduler::new(config.policy.build(config.workload));
    let (table, timings) = scheduler.run_timed(&config.source, &mut transport).await?;

    // Closing the outbound streams lets the workers hang up.
    drop(transport);
    server.shutdown().await?;

    let policy = config.policy.to_string();
    let report = Report::new(&table, &config.workload, &policy, config.workers, timings);
    print!("{}", report.render(config.format)?);

    Ok(())
}
