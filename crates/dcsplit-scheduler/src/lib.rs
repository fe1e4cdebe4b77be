//! dcsplit-scheduler: static partitioning scheduler.
//!
//! Splits a placement instance into disjoint partitions, solves them in
//! parallel through an [`InstanceSolver`], and merges the partial plans
//! into one reconfiguration plan.
//!
//! # Architecture
//!
//! ```text
//! StaticPartitioning
//!   ├── Partitioner (split before any solving starts)
//!   ├── bounded worker pool (Semaphore + JoinSet + spawn_blocking)
//!   │     └── InstanceSolver::solve, one call per partition
//!   ├── StatisticsCollector (appended in completion order)
//!   └── merge into one ReconfigurationPlan
//! ```

pub mod config;
pub mod error;
pub mod partitioning;
pub mod solver;

pub use config::{PartitioningConfig, SchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use partitioning::{SolveOutcome, SolvePhase, StaticPartitioning, default_workers};
pub use solver::{InstanceResult, InstanceSolver, StopSignal};
