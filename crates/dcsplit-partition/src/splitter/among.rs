//! Constraints choosing one candidate node group for a set of VMs.

use std::collections::BTreeSet;

use tracing::warn;

use dcsplit_model::{Constraint, ConstraintKind, Instance, NodeId};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;
use crate::splitter::GroupedSubsetsPolicy;

pub(super) fn split(
    c: &Constraint,
    policy: GroupedSubsetsPolicy,
    pos: &Positions,
    parts: &mut [Instance],
) -> SplitResult<()> {
    let ConstraintKind::Among { vms, groups } = &c.kind else {
        return Err(SplitError::Unsupported {
            policy: "grouped-subsets",
            kind: c.constraint_type(),
        });
    };

    let local = pos.vms.group(vms.iter().copied())?;
    if local.len() > 1 {
        match policy {
            GroupedSubsetsPolicy::Reject => {
                return Err(SplitError::StraddlingGroups {
                    partitions: local.len(),
                });
            }
            GroupedSubsetsPolicy::BestEffort => warn!(
                constraint = %c,
                partitions = local.len(),
                "VMs straddle partitions, each partition may choose a different group"
            ),
        }
    }

    for (p, sub) in local {
        let part = &mut parts[p];
        let narrowed: Vec<BTreeSet<NodeId>> = groups
            .iter()
            .map(|g| {
                g.iter()
                    .copied()
                    .filter(|n| part.model.contains_node(*n))
                    .collect::<BTreeSet<_>>()
            })
            .filter(|g| !g.is_empty())
            .collect();
        if narrowed.is_empty() {
            // Posted anyway: the solver reports the partition as infeasible.
            warn!(
                constraint = %c,
                partition = p,
                "no candidate group has a node in the partition"
            );
        }
        part.constraints.push(c.derive(ConstraintKind::Among {
            vms: sub,
            groups: narrowed,
        }));
    }
    Ok(())
}
