//! The external solver seam.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dcsplit_model::{Instance, Parameters, ReconfigurationPlan};
use dcsplit_stats::SolvingStatistics;

/// Cooperative cancellation flag shared between the orchestrator and one
/// solve. Solvers poll it and give up as soon as they can.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// What a solver returns for one instance.
#[derive(Debug, Clone)]
pub struct InstanceResult {
    /// `None` when the instance has no solution, or none was found in time.
    pub plan: Option<ReconfigurationPlan>,
    pub statistics: SolvingStatistics,
}

/// Solves one instance. Called concurrently from several worker threads,
/// one call per partition.
pub trait InstanceSolver: Send + Sync + 'static {
    fn solve(
        &self,
        ps: &Parameters,
        instance: &Instance,
        stop: &StopSignal,
    ) -> anyhow::Result<InstanceResult>;
}
