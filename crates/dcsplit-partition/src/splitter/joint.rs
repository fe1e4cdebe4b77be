//! Constraints whose elements must be evaluated together.

use dcsplit_model::{Constraint, ConstraintKind, Instance};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;

pub(super) fn split(c: &Constraint, pos: &Positions, parts: &mut [Instance]) -> SplitResult<()> {
    match &c.kind {
        ConstraintKind::Gather { .. }
        | ConstraintKind::MaxOnline { .. }
        | ConstraintKind::RunningCapacity { .. }
        | ConstraintKind::ResourceCapacity { .. }
        | ConstraintKind::SequentialVmTransitions { .. } => {}
        _ => {
            return Err(SplitError::Unsupported {
                policy: "single-partition",
                kind: c.constraint_type(),
            });
        }
    }

    let involved = pos.partitions_of(&c.kind.involved_vms(), &c.kind.involved_nodes())?;
    let mut it = involved.iter();
    match (it.next(), it.next()) {
        // Nothing referenced, nothing to enforce.
        (None, _) => Ok(()),
        (Some(&p), None) => {
            parts[p].constraints.push(c.clone());
            Ok(())
        }
        (Some(_), Some(_)) => Err(SplitError::SpansPartitions {
            partitions: involved.len(),
        }),
    }
}
