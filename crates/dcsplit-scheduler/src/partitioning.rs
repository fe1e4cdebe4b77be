//! Static partitioning of an instance across parallel solves.
//!
//! A solve goes through `Idle -> Splitting -> Dispatched -> Collecting`
//! and ends in `Merged` or `Failed`. Splitting is single-threaded and
//! happens before any solver runs. Each partition is then solved on the
//! blocking pool, at most `workers` at a time, and results are collected
//! in completion order. Collection always drains every partition, even
//! once one is known to have failed, so the statistics stay complete.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use dcsplit_model::{Instance, Parameters, ReconfigurationPlan};
use dcsplit_partition::Partitioner;
use dcsplit_stats::{PartitioningStatistics, StatisticsCollector, epoch_millis};

use crate::error::{SchedulerError, SchedulerResult};
use crate::solver::{InstanceResult, InstanceSolver, StopSignal};

/// Where the last (or current) solve stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePhase {
    Idle,
    Splitting,
    Dispatched,
    Collecting,
    Merged,
    Failed,
}

impl SolvePhase {
    /// Whether a solve is between its split and its outcome.
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Splitting | Self::Dispatched | Self::Collecting)
    }
}

/// Result of a partitioned solve that did not fail.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// The merged plan, or `None` when some partition has no solution.
    pub plan: Option<ReconfigurationPlan>,
    pub statistics: PartitioningStatistics,
}

type TaskOutput = (usize, Result<anyhow::Result<InstanceResult>, JoinError>);

/// Raises every stop signal when dropped unless disarmed, so that solves
/// do not outlive an abandoned `solve` future.
struct StopOnDrop {
    signals: Vec<StopSignal>,
    armed: bool,
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        if self.armed {
            for s in &self.signals {
                s.stop();
            }
        }
    }
}

/// Marks an abandoned solve as failed so the orchestrator can be reused.
struct InFlight<'a> {
    phase: &'a Mutex<SolvePhase>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut phase = lock(self.phase);
        if phase.in_flight() {
            warn!(phase = ?*phase, "partitioned solve abandoned");
            *phase = SolvePhase::Failed;
        }
    }
}

/// Solves an instance by solving disjoint partitions of it in parallel.
///
/// One solve at a time: a call made while another is in flight fails with
/// [`SchedulerError::Busy`]. The phase, stop handles and statistics
/// describe the latest call.
pub struct StaticPartitioning {
    partitioner: Arc<dyn Partitioner>,
    solver: Arc<dyn InstanceSolver>,
    workers: usize,
    phase: Mutex<SolvePhase>,
    stops: Mutex<Vec<StopSignal>>,
    collector: StatisticsCollector,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Number of processing units, at least 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl StaticPartitioning {
    pub fn new(partitioner: Arc<dyn Partitioner>, solver: Arc<dyn InstanceSolver>) -> Self {
        Self {
            partitioner,
            solver,
            workers: default_workers(),
            phase: Mutex::new(SolvePhase::Idle),
            stops: Mutex::new(Vec::new()),
            collector: StatisticsCollector::new(),
        }
    }

    /// Bound the number of partitions solved at the same time.
    pub fn with_workers(mut self, workers: usize) -> SchedulerResult<Self> {
        if workers == 0 {
            return Err(SchedulerError::InvalidWorkers);
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn phase(&self) -> SolvePhase {
        *lock(&self.phase)
    }

    /// Statistics of the latest solve, updated while partitions complete.
    pub fn statistics(&self) -> Option<PartitioningStatistics> {
        self.collector.snapshot()
    }

    /// Ask every in-flight partition solve to stop. Best effort: it is up
    /// to the solver to notice.
    pub fn stop(&self) {
        let stops = lock(&self.stops);
        info!(partitions = stops.len(), "stop requested");
        for s in stops.iter() {
            s.stop();
        }
    }

    fn set_phase(&self, phase: SolvePhase) {
        debug!(?phase, "solve phase");
        *lock(&self.phase) = phase;
    }

    fn claim(&self) -> SchedulerResult<InFlight<'_>> {
        let mut phase = lock(&self.phase);
        if phase.in_flight() {
            return Err(SchedulerError::Busy(*phase));
        }
        debug!(phase = ?SolvePhase::Splitting, "solve phase");
        *phase = SolvePhase::Splitting;
        Ok(InFlight { phase: &self.phase })
    }

    fn fail(&self, e: SchedulerError) -> SchedulerResult<SolveOutcome> {
        warn!(error = %e, "partitioned solve failed");
        self.set_phase(SolvePhase::Failed);
        Err(e)
    }

    /// Split `instance`, solve every partition and merge the partial plans.
    pub async fn solve(&self, ps: &Parameters, instance: &Instance) -> SchedulerResult<SolveOutcome> {
        let _in_flight = self.claim()?;
        let started = Instant::now();
        self.collector.begin(PartitioningStatistics::new(
            ps.clone(),
            instance,
            epoch_millis(),
            self.workers,
        ));

        let parts = match self.partitioner.split(ps, instance) {
            Ok(parts) => parts,
            Err(e) => return self.fail(e.into()),
        };
        let split_ms = started.elapsed().as_millis() as u64;
        let nb_parts = parts.len();
        self.collector.update(|s| {
            s.split_ms = split_ms;
            s.nb_partitions = nb_parts;
        });
        info!(partitions = nb_parts, split_ms, workers = self.workers, "instance split");

        let signals: Vec<StopSignal> = (0..nb_parts).map(|_| StopSignal::new()).collect();
        *lock(&self.stops) = signals.clone();
        let mut guard = StopOnDrop {
            signals: signals.clone(),
            armed: true,
        };

        let solving = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut set: JoinSet<TaskOutput> = JoinSet::new();
        for (p, (part, stop)) in parts.into_iter().zip(signals).enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let solver = Arc::clone(&self.solver);
            let ps = ps.clone();
            set.spawn(async move {
                // Hold the permit until the solve returns.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (p, Ok(Err(anyhow::anyhow!("worker pool closed"))));
                };
                debug!(partition = p, "partition solve started");
                let res =
                    tokio::task::spawn_blocking(move || solver.solve(&ps, &part, &stop)).await;
                (p, res)
            });
        }
        self.set_phase(SolvePhase::Dispatched);

        self.set_phase(SolvePhase::Collecting);
        let mut plans: Vec<(usize, Option<ReconfigurationPlan>)> = Vec::with_capacity(nb_parts);
        let mut failure: Option<SchedulerError> = None;
        while let Some(joined) = set.join_next().await {
            let err = match joined {
                Ok((p, Ok(Ok(res)))) => {
                    debug!(
                        partition = p,
                        solved = res.plan.is_some(),
                        "partition solve completed"
                    );
                    self.collector.record(p, res.statistics);
                    plans.push((p, res.plan));
                    continue;
                }
                Ok((p, Ok(Err(source)))) => SchedulerError::Worker {
                    partition: p,
                    source,
                },
                Ok((p, Err(e))) if e.is_panic() => SchedulerError::WorkerPanicked {
                    partition: p,
                    message: panic_message(e),
                },
                Ok((_, Err(e))) | Err(e) => SchedulerError::Interrupted(e.to_string()),
            };
            warn!(error = %err, "partition solve failed, stopping the others");
            self.stop();
            failure.get_or_insert(err);
        }
        guard.armed = false;

        let solve_ms = solving.elapsed().as_millis() as u64;
        self.collector.update(|s| s.solve_ms = solve_ms);
        info!(solve_ms, collected = plans.len(), "partition results collected");

        if let Some(e) = failure {
            return self.fail(e);
        }
        let statistics = self
            .collector
            .snapshot()
            .unwrap_or_else(|| PartitioningStatistics::new(ps.clone(), instance, 0, self.workers));

        if plans.iter().any(|(_, plan)| plan.is_none()) {
            info!(
                solved = plans.iter().filter(|(_, plan)| plan.is_some()).count(),
                partitions = nb_parts,
                "no solution"
            );
            self.set_phase(SolvePhase::Merged);
            return Ok(SolveOutcome {
                plan: None,
                statistics,
            });
        }

        plans.sort_by_key(|(p, _)| *p);
        let mut merged = ReconfigurationPlan::new(instance.model.clone());
        for (p, plan) in plans.iter().filter_map(|(p, plan)| plan.as_ref().map(|pl| (*p, pl))) {
            for a in plan {
                if !merged.add(*a) {
                    return self.fail(SchedulerError::Merge {
                        partition: p,
                        action: *a,
                    });
                }
            }
        }
        info!(actions = merged.size(), duration = merged.duration(), "plans merged");
        self.set_phase(SolvePhase::Merged);
        Ok(SolveOutcome {
            plan: Some(merged),
            statistics,
        })
    }
}

fn panic_message(e: JoinError) -> String {
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcsplit_partition::FixedSizePartitioning;

    struct Unreachable;

    impl InstanceSolver for Unreachable {
        fn solve(&self, _: &Parameters, _: &Instance, _: &StopSignal) -> anyhow::Result<InstanceResult> {
            anyhow::bail!("not expected to run")
        }
    }

    fn orchestrator() -> StaticPartitioning {
        StaticPartitioning::new(
            Arc::new(FixedSizePartitioning::new(1).unwrap()),
            Arc::new(Unreachable),
        )
    }

    #[test]
    fn zero_workers_is_refused() {
        assert!(matches!(
            orchestrator().with_workers(0),
            Err(SchedulerError::InvalidWorkers)
        ));
    }

    #[test]
    fn defaults() {
        let sp = orchestrator();
        assert!(sp.workers() >= 1);
        assert_eq!(sp.phase(), SolvePhase::Idle);
        assert!(sp.statistics().is_none());
        // Nothing in flight, nothing to do.
        sp.stop();
    }

    #[test]
    fn in_flight_phases() {
        let in_flight: Vec<SolvePhase> = [
            SolvePhase::Idle,
            SolvePhase::Splitting,
            SolvePhase::Dispatched,
            SolvePhase::Collecting,
            SolvePhase::Merged,
            SolvePhase::Failed,
        ]
        .into_iter()
        .filter(|p| p.in_flight())
        .collect();
        assert_eq!(
            in_flight,
            vec![SolvePhase::Splitting, SolvePhase::Dispatched, SolvePhase::Collecting]
        );
    }

    #[test]
    fn claim_is_exclusive_until_released() {
        let sp = orchestrator();
        let first = sp.claim().unwrap();
        assert_eq!(sp.phase(), SolvePhase::Splitting);
        assert!(matches!(
            sp.claim(),
            Err(SchedulerError::Busy(SolvePhase::Splitting))
        ));

        // Released without an outcome: the solve counts as failed.
        drop(first);
        assert_eq!(sp.phase(), SolvePhase::Failed);

        let second = sp.claim().unwrap();
        sp.set_phase(SolvePhase::Merged);
        drop(second);
        assert_eq!(sp.phase(), SolvePhase::Merged);
    }

    #[test]
    fn dropping_an_armed_guard_stops_everything() {
        let signals = vec![StopSignal::new(), StopSignal::new()];
        drop(StopOnDrop {
            signals: signals.clone(),
            armed: true,
        });
        assert!(signals.iter().all(StopSignal::is_stopped));

        let signals = vec![StopSignal::new()];
        drop(StopOnDrop {
            signals: signals.clone(),
            armed: false,
        });
        assert!(!signals[0].is_stopped());
    }
}
