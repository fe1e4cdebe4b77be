//! Scheduler error types.

use thiserror::Error;

use dcsplit_model::Action;
use dcsplit_partition::SplitError;

use crate::partitioning::SolvePhase;

/// Errors that fail a partitioned solve.
///
/// Infeasibility is not an error: it is reported as a missing plan.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("partitioning failed: {0}")]
    Split(#[from] SplitError),

    #[error("solver failed on partition {partition}: {source:#}")]
    Worker {
        partition: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("solver panicked on partition {partition}: {message}")]
    WorkerPanicked { partition: usize, message: String },

    #[error("interrupted while waiting for partition results: {0}")]
    Interrupted(String),

    #[error("partition {partition}: action '{action}' cannot be merged into the global plan")]
    Merge { partition: usize, action: Action },

    #[error("a partitioned solve is already running (phase {0:?})")]
    Busy(SolvePhase),

    #[error("worker count must be at least 1")]
    InvalidWorkers,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
