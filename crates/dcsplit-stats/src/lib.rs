//! dcsplit-stats: solving statistics for the partitioning scheduler.
//!
//! # Architecture
//!
//! ```text
//! Metrics                 additive counters (nodes, backtracks, ...)
//!   └── SolvingStatistics   one solve: sizes, durations, solutions
//!         ├── StagedStatistics        same instance, sequential stages
//!         └── PartitioningStatistics  disjoint partitions solved in parallel
//!
//! StatisticsCollector     shared handle the orchestrator appends to
//! render_csv()            CSV lines for benchmarking tooling
//! ```

pub mod collector;
pub mod metrics;
pub mod partitioning;
pub mod report;
pub mod solving;
pub mod staged;

pub use collector::StatisticsCollector;
pub use metrics::Metrics;
pub use partitioning::{PartitionStatistics, PartitioningStatistics};
pub use report::render_csv;
pub use solving::{SolutionStatistics, SolvingStatistics, epoch_millis};
pub use staged::StagedStatistics;
