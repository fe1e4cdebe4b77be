//! Per-policy constraint splitting.
//!
//! A splitter localizes one constraint of the origin instance to the
//! partitions it concerns, appending derived constraints to them. It never
//! touches a partition's model. Every constraint type follows exactly one
//! policy:
//!
//! | policy | emits |
//! |---|---|
//! | [`Splitter::SingleElement`] | the constraint, in the partition of its only element |
//! | [`Splitter::GroupRestriction`] | one restricted copy per partition holding enough members |
//! | [`Splitter::SinglePartition`] | the constraint, if all its elements share one partition |
//! | [`Splitter::GroupedSubsets`] | narrowed VMs and candidate groups per partition |

use serde::{Deserialize, Serialize};

use dcsplit_model::{Constraint, ConstraintType, Instance};

use crate::error::SplitResult;
use crate::index::Positions;

mod among;
mod group;
mod joint;
mod single;

/// What to do with a grouped-subsets constraint whose VMs straddle
/// several partitions. Narrowing it per partition lets each partition
/// pick its own candidate group, so the result may break the original
/// constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupedSubsetsPolicy {
    /// Post the narrowed constraints anyway.
    #[default]
    BestEffort,
    /// Fail the split.
    Reject,
}

/// A splitting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    SingleElement,
    GroupRestriction,
    SinglePartition,
    GroupedSubsets(GroupedSubsetsPolicy),
}

impl Splitter {
    /// The policy every constraint type follows by default.
    pub fn standard(t: ConstraintType, policy: GroupedSubsetsPolicy) -> Splitter {
        match t {
            ConstraintType::Running
            | ConstraintType::Ready
            | ConstraintType::Sleeping
            | ConstraintType::Killed
            | ConstraintType::Root
            | ConstraintType::Ban
            | ConstraintType::Fence
            | ConstraintType::Preserve
            | ConstraintType::Online
            | ConstraintType::Offline
            | ConstraintType::Quarantine
            | ConstraintType::Overbook => Splitter::SingleElement,
            ConstraintType::Spread | ConstraintType::Lonely | ConstraintType::Split => {
                Splitter::GroupRestriction
            }
            ConstraintType::Gather
            | ConstraintType::MaxOnline
            | ConstraintType::RunningCapacity
            | ConstraintType::ResourceCapacity
            | ConstraintType::SequentialVmTransitions => Splitter::SinglePartition,
            ConstraintType::Among => Splitter::GroupedSubsets(policy),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Splitter::SingleElement => "single-element",
            Splitter::GroupRestriction => "group-restriction",
            Splitter::SinglePartition => "single-partition",
            Splitter::GroupedSubsets(_) => "grouped-subsets",
        }
    }

    /// Append the partition-local versions of `c` to `parts`.
    pub fn split(
        &self,
        c: &Constraint,
        positions: &Positions,
        parts: &mut [Instance],
    ) -> SplitResult<()> {
        match self {
            Splitter::SingleElement => single::split(c, positions, parts),
            Splitter::GroupRestriction => group::split(c, positions, parts),
            Splitter::SinglePartition => joint::split(c, positions, parts),
            Splitter::GroupedSubsets(policy) => among::split(c, *policy, positions, parts),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use dcsplit_model::{Instance, Model, NodeId, Objective, VmId};

    use crate::index::Positions;

    /// One partition per entry of `groups`. Node `n` hosts VM `n`.
    pub(crate) fn partitions(groups: &[&[u32]]) -> (Positions, Vec<Instance>) {
        let mut pos = Positions::default();
        let mut parts = Vec::new();
        for (p, g) in groups.iter().enumerate() {
            let mut mo = Model::new();
            for &n in g.iter() {
                mo.mapping.add_online_node(NodeId(n));
                mo.mapping.add_running_vm(VmId(n), NodeId(n));
                pos.nodes.insert(NodeId(n), p);
                pos.vms.insert(VmId(n), p);
            }
            parts.push(Instance::empty(mo, Objective::MinMttr));
        }
        (pos, parts)
    }
}
