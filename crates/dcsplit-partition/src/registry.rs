//! Constraint type to splitter lookup.

use std::collections::HashMap;

use tracing::debug;

use dcsplit_model::{Constraint, ConstraintType, Instance};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;
use crate::splitter::{GroupedSubsetsPolicy, Splitter};

/// One splitter per constraint type. Splitting a constraint whose type
/// has no entry is an error.
#[derive(Debug, Clone)]
pub struct SplitterRegistry {
    splitters: HashMap<ConstraintType, Splitter>,
}

impl SplitterRegistry {
    /// A registry with no splitter at all.
    pub fn empty() -> Self {
        Self {
            splitters: HashMap::new(),
        }
    }

    /// Every constraint type mapped to its standard policy.
    pub fn standard(policy: GroupedSubsetsPolicy) -> Self {
        let splitters = ConstraintType::ALL
            .iter()
            .map(|t| (*t, Splitter::standard(*t, policy)))
            .collect();
        Self { splitters }
    }

    /// Install `s` for `t`. Returns the splitter it replaces.
    pub fn register(&mut self, t: ConstraintType, s: Splitter) -> Option<Splitter> {
        self.splitters.insert(t, s)
    }

    pub fn unregister(&mut self, t: ConstraintType) -> Option<Splitter> {
        self.splitters.remove(&t)
    }

    pub fn get(&self, t: ConstraintType) -> Option<Splitter> {
        self.splitters.get(&t).copied()
    }

    pub fn is_registered(&self, t: ConstraintType) -> bool {
        self.splitters.contains_key(&t)
    }

    /// Localize `c` into `parts`. Failures name the constraint.
    pub fn split(
        &self,
        c: &Constraint,
        positions: &Positions,
        parts: &mut [Instance],
    ) -> SplitResult<()> {
        let t = c.constraint_type();
        let res = match self.get(t) {
            Some(s) => s.split(c, positions, parts),
            None => Err(SplitError::Unregistered(t)),
        };
        res.map_err(|e| {
            debug!(constraint = %c, error = %e, "constraint split refused");
            SplitError::Constraint {
                constraint: c.clone(),
                source: Box::new(e),
            }
        })
    }
}

impl Default for SplitterRegistry {
    fn default() -> Self {
        Self::standard(GroupedSubsetsPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::fixtures::partitions;
    use dcsplit_model::{ConstraintKind, VmId};

    #[test]
    fn standard_covers_every_type() {
        let r = SplitterRegistry::default();
        for t in ConstraintType::ALL {
            assert!(r.is_registered(t), "{t} has no splitter");
        }
    }

    #[test]
    fn unregistered_type_is_an_error() {
        let (pos, mut parts) = partitions(&[&[0]]);
        let mut r = SplitterRegistry::default();
        assert_eq!(r.unregister(ConstraintType::Root), Some(Splitter::SingleElement));

        let c = Constraint::new(ConstraintKind::Root { vm: VmId(0) });
        let err = r.split(&c, &pos, &mut parts).unwrap_err();
        match err {
            SplitError::Constraint { constraint, source } => {
                assert_eq!(constraint, c);
                assert!(matches!(*source, SplitError::Unregistered(ConstraintType::Root)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn register_overrides_policy() {
        let (pos, mut parts) = partitions(&[&[0, 1], &[2]]);
        let mut r = SplitterRegistry::empty();
        r.register(ConstraintType::Spread, Splitter::SinglePartition);
        let c = Constraint::new(ConstraintKind::Spread {
            vms: [VmId(0), VmId(2)].into(),
        });

        // vm0 and vm2 sit in different partitions.
        assert!(r.split(&c, &pos, &mut parts).is_err());
        r.register(ConstraintType::Spread, Splitter::GroupRestriction);
        assert!(r.split(&c, &pos, &mut parts).is_ok());
    }

    #[test]
    fn error_message_names_the_constraint() {
        let (pos, mut parts) = partitions(&[&[0], &[1]]);
        let c = Constraint::new(ConstraintKind::Gather {
            vms: [VmId(0), VmId(1)].into(),
        });
        let msg = SplitterRegistry::default()
            .split(&c, &pos, &mut parts)
            .unwrap_err()
            .to_string();
        assert!(msg.starts_with("unable to split gather(vms=[vm0, vm1]"), "{msg}");
    }
}
