use clap::Parser;

use jf_coordinator::config::RunArgs;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub run: RunArgs,

    /// Number of workers to wait for before dispatching.
    #[arg(short, long)]
    pub workers: usize,

    /// The port for the server to run on.
    #[arg(long, default_value = "8030")]
    pub port: u16,
}
