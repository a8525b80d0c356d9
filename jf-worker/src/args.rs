use clap::Parser;

use common::{FarmError, Result};
use workload::Workload;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The address of the coordinator server
    #[arg(short = 'j', long = "join", default_value = "http://[::1]:8030")]
    pub address: String,

    /// Reduction applied to every job (max, min or sum). Must match the
    /// coordinator's.
    #[arg(long, default_value = "max")]
    pub workload: String,
}

impl Args {
    pub fn workload(&self) -> Result<Workload> {
        workload::try_named(&self.workload).ok_or_else(|| {
            FarmError::Config(format!(
                "unknown workload `{}`, expected one of {:?}",
                self.workload,
                workload::NAMES
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_max_on_the_local_coordinator() {
        let args = Args::try_parse_from(["jf-worker"]).unwrap();
        assert_eq!(args.address, "http://[::1]:8030");
        assert_eq!(args.workload().unwrap().name, "max");
    }

    #[test]
    fn unknown_workload_is_a_config_error() {
        let args = Args::try_parse_from(["jf-worker", "--workload", "median"]).unwrap();
        assert!(matches!(args.workload(), Err(FarmError::Config(_))));
    }
}
