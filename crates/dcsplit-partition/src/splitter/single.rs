//! Constraints naming exactly one VM or one node.

use std::collections::BTreeSet;

use dcsplit_model::{Constraint, ConstraintKind, Instance, NodeId};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;

pub(super) fn split(c: &Constraint, pos: &Positions, parts: &mut [Instance]) -> SplitResult<()> {
    let p = match &c.kind {
        ConstraintKind::Running { vm }
        | ConstraintKind::Ready { vm }
        | ConstraintKind::Sleeping { vm }
        | ConstraintKind::Killed { vm }
        | ConstraintKind::Root { vm }
        | ConstraintKind::Ban { vm, .. }
        | ConstraintKind::Fence { vm, .. }
        | ConstraintKind::Preserve { vm, .. } => pos.vms.require(*vm)?,
        ConstraintKind::Online { node }
        | ConstraintKind::Offline { node }
        | ConstraintKind::Quarantine { node }
        | ConstraintKind::Overbook { node, .. } => pos.nodes.require(*node)?,
        _ => {
            return Err(SplitError::Unsupported {
                policy: "single-element",
                kind: c.constraint_type(),
            });
        }
    };

    let part = &mut parts[p];
    let kind = match &c.kind {
        ConstraintKind::Ban { vm, nodes } => ConstraintKind::Ban {
            vm: *vm,
            nodes: local_nodes(nodes, part),
        },
        ConstraintKind::Fence { vm, nodes } => ConstraintKind::Fence {
            vm: *vm,
            nodes: local_nodes(nodes, part),
        },
        other => other.clone(),
    };
    part.constraints.push(c.derive(kind));
    Ok(())
}

fn local_nodes(nodes: &BTreeSet<NodeId>, part: &Instance) -> BTreeSet<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|n| part.model.contains_node(*n))
        .collect()
}
