use common::{FarmError, JobId, JobResult, Result};

/// Results of a batch, indexed by job id. Each slot is written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    values: Vec<Option<i64>>,

    /// Number of filled slots.
    recorded: usize,
}

impl ResultTable {
    /// Empty table for a batch of `job_count` jobs.
    pub fn new(job_count: usize) -> Self {
        Self {
            values: vec![None; job_count],
            recorded: 0,
        }
    }

    /// Store a result, correlated by the job id it carries.
    ///
    /// A job id outside the batch, or a second result for the same job,
    /// is a protocol violation.
    pub fn record(&mut self, result: JobResult) -> Result<()> {
        let slot = self
            .values
            .get_mut(result.job_id)
            .ok_or(FarmError::UnknownJob(result.job_id))?;

        if slot.is_some() {
            return Err(FarmError::DuplicateResult(result.job_id));
        }

        *slot = Some(result.value);
        self.recorded += 1;
        Ok(())
    }

    pub fn get(&self, job_id: JobId) -> Option<i64> {
        self.values.get(job_id).copied().flatten()
    }

    /// Size of the batch the table was built for.
    pub fn job_count(&self) -> usize {
        self.values.len()
    }

    /// Number of results recorded so far.
    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Whether every job of the batch has its result.
    pub fn is_complete(&self) -> bool {
        self.recorded == self.values.len()
    }

    /// Ids of the jobs still waiting for a result.
    pub fn missing(&self) -> Vec<JobId> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_none())
            .map(|(job_id, _)| job_id)
            .collect()
    }

    /// Recorded results in job id order.
    pub fn results(&self) -> Vec<JobResult> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(job_id, value)| value.map(|value| JobResult::new(job_id, value)))
            .collect()
    }
}
