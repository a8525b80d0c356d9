//! Wire layout of job and result bodies.
//!
//! Workers hold no state about job identity, so the job id travels inside
//! every body: a job is `[jobId] ++ payload` and a result is
//! `[value, jobId]`. Both directions use these layouts for every policy.

use serde::{Deserialize, Serialize};

use crate::error::{FarmError, Result};
use crate::JobId;

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub payload: Vec<i64>,
}

impl Job {
    pub fn new(id: JobId, payload: Vec<i64>) -> Self {
        Self { id, payload }
    }

    /// Consumes the job and lays it out as a message body.
    pub fn into_body(self) -> Vec<i64> {
        let mut body = Vec::with_capacity(self.payload.len() + 1);
        body.push(self.id as i64);
        body.extend(self.payload);
        body
    }

    /// Parse a job body. The body must at least carry the job id.
    pub fn from_body(mut body: Vec<i64>) -> Result<Self> {
        if body.is_empty() {
            return Err(FarmError::Protocol("job message without a job id".into()));
        }
        let payload = body.split_off(1);
        let id = decode_job_id(body[0])?;
        Ok(Self { id, payload })
    }
}

/// The reduced value of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub value: i64,
}

impl JobResult {
    pub fn new(job_id: JobId, value: i64) -> Self {
        Self { job_id, value }
    }

    pub fn into_body(self) -> Vec<i64> {
        vec![self.value, self.job_id as i64]
    }

    pub fn from_body(body: &[i64]) -> Result<Self> {
        match body {
            [value, job_id] => Ok(Self {
                job_id: decode_job_id(*job_id)?,
                value: *value,
            }),
            _ => Err(FarmError::Protocol(format!(
                "result message must carry 2 values, got {}",
                body.len()
            ))),
        }
    }
}

fn decode_job_id(raw: i64) -> Result<JobId> {
    JobId::try_from(raw).map_err(|_| FarmError::Protocol(format!("invalid job id {raw}")))
}
