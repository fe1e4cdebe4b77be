//! Element to partition lookups.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use dcsplit_model::{Element, NodeId, VmId};

use crate::error::{SplitError, SplitResult};

/// Maps every element of one kind to the index of the partition holding
/// it. Built once per split, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PositionIndex<E> {
    positions: HashMap<E, usize>,
}

impl<E> Default for PositionIndex<E> {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }
}

impl<E> PositionIndex<E>
where
    E: Copy + Eq + Hash + Ord + Into<Element>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `e` in `partition`. Returns the previous partition, if any.
    pub fn insert(&mut self, e: E, partition: usize) -> Option<usize> {
        self.positions.insert(e, partition)
    }

    pub fn position(&self, e: E) -> Option<usize> {
        self.positions.get(&e).copied()
    }

    pub fn require(&self, e: E) -> SplitResult<usize> {
        self.position(e)
            .ok_or_else(|| SplitError::UnknownElement(e.into()))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sort `elems` by partition.
    pub fn group(
        &self,
        elems: impl IntoIterator<Item = E>,
    ) -> SplitResult<BTreeMap<usize, BTreeSet<E>>> {
        let mut out: BTreeMap<usize, BTreeSet<E>> = BTreeMap::new();
        for e in elems {
            out.entry(self.require(e)?).or_default().insert(e);
        }
        Ok(out)
    }

    /// Partitions holding at least one of `elems`.
    pub fn partitions_of(&self, elems: impl IntoIterator<Item = E>) -> SplitResult<BTreeSet<usize>> {
        elems.into_iter().map(|e| self.require(e)).collect()
    }
}

/// The VM and node indexes of one split.
#[derive(Debug, Clone, Default)]
pub struct Positions {
    pub vms: PositionIndex<VmId>,
    pub nodes: PositionIndex<NodeId>,
}

impl Positions {
    /// Every partition some element of `vms` or `nodes` belongs to.
    pub fn partitions_of(&self, vms: &[VmId], nodes: &[NodeId]) -> SplitResult<BTreeSet<usize>> {
        let mut out = self.vms.partitions_of(vms.iter().copied())?;
        out.extend(self.nodes.partitions_of(nodes.iter().copied())?);
        Ok(out)
    }
}
