//! Set constraints that stay correct on any subset of their VMs.
//!
//! Partitions are disjoint, so restricting such a constraint to the VMs of
//! one partition loses nothing: the VMs of other partitions can never
//! interact with them.

use std::collections::{BTreeMap, BTreeSet};

use dcsplit_model::{Constraint, ConstraintKind, Instance, VmId};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;

pub(super) fn split(c: &Constraint, pos: &Positions, parts: &mut [Instance]) -> SplitResult<()> {
    match &c.kind {
        ConstraintKind::Spread { vms } => {
            // A single VM cannot share a host with itself.
            for (p, sub) in pos.vms.group(vms.iter().copied())? {
                if sub.len() >= 2 {
                    parts[p].constraints.push(c.derive(ConstraintKind::Spread { vms: sub }));
                }
            }
        }
        ConstraintKind::Lonely { vms } => {
            // Still binding for one VM: it must not share with outsiders.
            for (p, sub) in pos.vms.group(vms.iter().copied())? {
                parts[p].constraints.push(c.derive(ConstraintKind::Lonely { vms: sub }));
            }
        }
        ConstraintKind::Split { groups } => {
            let mut local: BTreeMap<usize, Vec<BTreeSet<VmId>>> = BTreeMap::new();
            for (gi, g) in groups.iter().enumerate() {
                for (p, sub) in pos.vms.group(g.iter().copied())? {
                    local.entry(p).or_insert_with(|| vec![BTreeSet::new(); groups.len()])[gi] = sub;
                }
            }
            for (p, gs) in local {
                let gs: Vec<BTreeSet<VmId>> = gs.into_iter().filter(|g| !g.is_empty()).collect();
                if gs.len() >= 2 {
                    parts[p].constraints.push(c.derive(ConstraintKind::Split { groups: gs }));
                }
            }
        }
        _ => {
            return Err(SplitError::Unsupported {
                policy: "group-restriction",
                kind: c.constraint_type(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::fixtures::partitions;

    fn vms(ids: &[u32]) -> BTreeSet<VmId> {
        ids.iter().map(|i| VmId(*i)).collect()
    }

    #[test]
    fn spread_skips_partitions_with_a_single_member() {
        let (pos, mut parts) = partitions(&[&[0, 1], &[2, 3]]);
        let c = Constraint::continuous(ConstraintKind::Spread { vms: vms(&[0, 1, 2]) });

        split(&c, &pos, &mut parts).unwrap();
        assert_eq!(
            parts[0].constraints,
            vec![Constraint::continuous(ConstraintKind::Spread { vms: vms(&[0, 1]) })]
        );
        assert!(parts[1].constraints.is_empty());
    }

    #[test]
    fn lonely_keeps_single_members() {
        let (pos, mut parts) = partitions(&[&[0, 1], &[2]]);
        let c = Constraint::new(ConstraintKind::Lonely { vms: vms(&[0, 2]) });

        split(&c, &pos, &mut parts).unwrap();
        assert_eq!(parts[0].constraints[0].kind, ConstraintKind::Lonely { vms: vms(&[0]) });
        assert_eq!(parts[1].constraints[0].kind, ConstraintKind::Lonely { vms: vms(&[2]) });
    }

    #[test]
    fn split_needs_two_groups_in_a_partition() {
        let (pos, mut parts) = partitions(&[&[0, 1, 2], &[3, 4]]);
        let c = Constraint::new(ConstraintKind::Split {
            groups: vec![vms(&[0, 3]), vms(&[1, 2]), vms(&[4])],
        });

        split(&c, &pos, &mut parts).unwrap();
        assert_eq!(
            parts[0].constraints[0].kind,
            ConstraintKind::Split { groups: vec![vms(&[0]), vms(&[1, 2])] }
        );
        assert_eq!(
            parts[1].constraints[0].kind,
            ConstraintKind::Split { groups: vec![vms(&[3]), vms(&[4])] }
        );

        let (pos, mut parts) = partitions(&[&[0, 1], &[2, 3]]);
        let c = Constraint::new(ConstraintKind::Split {
            groups: vec![vms(&[0, 1]), vms(&[2, 3])],
        });
        split(&c, &pos, &mut parts).unwrap();
        assert!(parts.iter().all(|p| p.constraints.is_empty()));
    }

    #[test]
    fn refuses_joint_constraints() {
        let (pos, mut parts) = partitions(&[&[0, 1]]);
        let c = Constraint::new(ConstraintKind::Gather { vms: vms(&[0, 1]) });
        assert!(matches!(
            split(&c, &pos, &mut parts),
            Err(SplitError::Unsupported { .. })
        ));
    }
}
