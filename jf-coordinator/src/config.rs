
use common::{FarmError, Result};
use workload::{JobSource, Workload};

use crate::policy::PolicyKind;
use crate::report::OutputFormat;

pub use common::cli::{exit_with_usage, parse_or_exit};

/// Batch description shared by every binary that runs a scheduler.
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Seed of the payload generator.
    pub seed: u64,

    /// Number of elements in every job.
    pub elements_per_job: usize,

    /// Number of jobs in the batch.
    pub job_count: usize,

    /// Dispatch policy.
    #[arg(short, long, value_enum, default_value_t = PolicyKind::Dynamic)]
    pub policy: PolicyKind,

    /// Reduction applied to every job (max, min or sum).
    #[arg(long, default_value = "max")]
    pub workload: String,

    /// How results are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// A validated run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub source: JobSource,
    pub policy: PolicyKind,
    pub workload: Workload,
    pub workers: usize,
    pub format: OutputFormat,
}

impl RunArgs {
    /// Check the arguments against the number of workers. Every failure
    /// here happens before anything is dispatched.
    pub fn validate(&self, workers: usize) -> Result<RunConfig> {
        if workers == 0 {
            return Err(FarmError::Config("at least one worker is required".into()));
        }

        if self.elements_per_job == 0 {
            return Err(FarmError::Config(
                "jobs must have at least one element".into(),
            ));
        }

        let workload = workload::try_named(&self.workload).ok_or_else(|| {
            FarmError::Config(format!(
                "unknown workload `{}`, expected one of {:?}",
                self.workload,
                workload::NAMES
            ))
        })?;

        if self.policy.requires_even_partition() && self.elements_per_job % workers != 0 {
            return Err(FarmError::Config(format!(
                "the {} policy needs the number of elements per job ({}) to be divisible by the number of workers ({})",
                self.policy, self.elements_per_job, workers
            )));
        }

        Ok(RunConfig {
            source: JobSource::new(self.seed, self.elements_per_job, self.job_count),
            policy: self.policy,
            workload,
            workers,
            format: self.format,
        })
    }
}
