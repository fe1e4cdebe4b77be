//! Error types for partitioning.

use thiserror::Error;

use dcsplit_model::{Constraint, ConstraintType, Element, NodeId};

/// Result type alias for partitioning operations.
pub type SplitResult<T> = Result<T, SplitError>;

/// Structural problems detected while splitting an instance.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("partition size must be at least 1")]
    InvalidSize,

    #[error("no partition to split into")]
    NoPartition,

    #[error("node group {0} is empty")]
    EmptyGroup(usize),

    #[error("node {0} is not part of the origin model")]
    UnknownNode(NodeId),

    #[error("node {node} belongs to groups {first} and {second}")]
    OverlappingGroups {
        node: NodeId,
        first: usize,
        second: usize,
    },

    #[error("node {0} is not covered by any group")]
    UncoveredNode(NodeId),

    #[error("{0} is not assigned to any partition")]
    UnknownElement(Element),

    #[error("no splitter registered for constraint type '{0}'")]
    Unregistered(ConstraintType),

    #[error("the {policy} policy does not apply to constraint type '{kind}'")]
    Unsupported {
        policy: &'static str,
        kind: ConstraintType,
    },

    #[error("elements spread over {partitions} partitions but must be evaluated jointly")]
    SpansPartitions { partitions: usize },

    #[error("VMs straddle {partitions} partitions, a consistent group choice cannot be enforced")]
    StraddlingGroups { partitions: usize },

    #[error("unable to split {constraint}: {source}")]
    Constraint {
        constraint: Constraint,
        #[source]
        source: Box<SplitError>,
    },
}
