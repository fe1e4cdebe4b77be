//! dcsplit-partition: splits a placement instance into disjoint partitions.
//!
//! Partitioning happens entirely before any solving starts and is
//! single-threaded. It never changes the origin instance: every partition
//! owns a restricted copy of the origin model and its own constraints.
//!
//! # Components
//!
//! - **`builder`**: node grouping (explicit or fixed-size) and partition assembly
//! - **`registry`**: constraint type to splitter lookup
//! - **`splitter`**: the four splitting policies
//! - **`index`**: element to partition positions

pub mod builder;
pub mod error;
pub mod index;
pub mod registry;
pub mod splitter;

pub use builder::{FixedSizePartitioning, NodeSetsPartitioning, Partitioner};
pub use error::{SplitError, SplitResult};
pub use index::{PositionIndex, Positions};
pub use registry::SplitterRegistry;
pub use splitter::{GroupedSubsetsPolicy, Splitter};
