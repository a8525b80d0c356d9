use common::{FarmError, PeerId, Result};

/// Whether a worker currently holds an unfinished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    #[default]
    Idle,
    Busy,
}

/// Readiness of every worker, indexed by rank - 1.
///
/// Only the dynamic policy keeps one. The static policies compute the
/// assignment from the job index and never need to look.
#[derive(Debug, Clone)]
pub struct WorkerRegistry {
    states: Vec<WorkerState>,
}

impl WorkerRegistry {
    /// All `workers` start off idle.
    pub fn new(workers: usize) -> Self {
        Self {
            states: vec![WorkerState::Idle; workers],
        }
    }

    /// Lowest ranked idle worker, if any.
    pub fn first_idle(&self) -> Option<PeerId> {
        self.states
            .iter()
            .position(|state| *state == WorkerState::Idle)
            .map(|index| index + 1)
    }

    /// Number of workers holding a job.
    pub fn busy_count(&self) -> usize {
        self.states
            .iter()
            .filter(|state| **state == WorkerState::Busy)
            .count()
    }

    pub fn get_worker_state(&self, worker: PeerId) -> Option<WorkerState> {
        worker
            .checked_sub(1)
            .and_then(|index| self.states.get(index))
            .copied()
    }

    /// Idle -> Busy on dispatch.
    pub fn assign(&mut self, worker: PeerId) -> Result<()> {
        let state = self.slot(worker)?;
        if *state == WorkerState::Busy {
            return Err(FarmError::Protocol(format!(
                "worker {worker} is already busy"
            )));
        }
        *state = WorkerState::Busy;
        Ok(())
    }

    /// Busy -> Idle when the worker's result comes in.
    pub fn release(&mut self, worker: PeerId) -> Result<()> {
        let state = self.slot(worker)?;
        if *state == WorkerState::Idle {
            return Err(FarmError::Protocol(format!(
                "result from worker {worker} which holds no job"
            )));
        }
        *state = WorkerState::Idle;
        Ok(())
    }

    fn slot(&mut self, worker: PeerId) -> Result<&mut WorkerState> {
        worker
            .checked_sub(1)
            .and_then(|index| self.states.get_mut(index))
            .ok_or_else(|| FarmError::Protocol(format!("no worker with rank {worker}")))
    }
}
