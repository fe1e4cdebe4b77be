//! Shared aggregation point for statistics of a running solve.
//!
//! The orchestrator appends per-partition reports as partitions complete
//! while callers may read a snapshot at any moment.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::partitioning::PartitioningStatistics;
use crate::solving::SolvingStatistics;

/// Cloneable handle over the statistics of the current (or last) run.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    inner: Arc<Mutex<Option<PartitioningStatistics>>>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PartitioningStatistics>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new run, discarding the previous statistics.
    pub fn begin(&self, stats: PartitioningStatistics) {
        *self.lock() = Some(stats);
    }

    /// Apply `f` to the current statistics. No-op before [`begin`](Self::begin).
    pub fn update(&self, f: impl FnOnce(&mut PartitioningStatistics)) {
        if let Some(stats) = self.lock().as_mut() {
            f(stats);
        }
    }

    /// Append the report of a completed partition.
    pub fn record(&self, partition: usize, stats: SolvingStatistics) {
        let mut guard = self.lock();
        let Some(all) = guard.as_mut() else {
            return;
        };
        debug!(
            partition,
            solutions = stats.solutions.len(),
            completed = stats.completed,
            "partition statistics recorded"
        );
        all.add_partition(partition, stats);
    }

    pub fn snapshot(&self) -> Option<PartitioningStatistics> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcsplit_model::{Instance, Parameters};

    #[test]
    fn record_before_begin_is_ignored() {
        let c = StatisticsCollector::new();
        c.record(0, SolvingStatistics::for_instance(Parameters::default(), &Instance::default(), 0));
        assert!(c.snapshot().is_none());
    }

    #[test]
    fn clones_share_the_same_run() {
        let c = StatisticsCollector::new();
        c.begin(PartitioningStatistics::new(Parameters::default(), &Instance::default(), 0, 2));

        let worker = c.clone();
        worker.record(1, SolvingStatistics::for_instance(Parameters::default(), &Instance::default(), 0));
        c.update(|s| s.solve_ms = 12);

        let snap = c.snapshot().unwrap();
        assert_eq!(snap.partitions().len(), 1);
        assert_eq!(snap.partitions()[0].partition, 1);
        assert!(snap.partition(0).is_none());
        assert_eq!(snap.solve_ms, 12);
    }

    #[test]
    fn begin_resets() {
        let c = StatisticsCollector::new();
        c.begin(PartitioningStatistics::new(Parameters::default(), &Instance::default(), 0, 1));
        c.record(0, SolvingStatistics::for_instance(Parameters::default(), &Instance::default(), 0));
        c.begin(PartitioningStatistics::new(Parameters::default(), &Instance::default(), 5, 1));

        let snap = c.snapshot().unwrap();
        assert!(snap.partitions().is_empty());
        assert_eq!(snap.start_ms, 5);
    }
}
