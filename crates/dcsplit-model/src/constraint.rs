//! Placement constraints.
//!
//! A [`Constraint`] is an immutable value: a [`ConstraintKind`] naming the
//! restricted elements, plus a satisfaction mode. Continuous constraints
//! must hold at every instant of a reconfiguration, discrete ones only in
//! the resulting model.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, VmId};

/// What a constraint restricts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    // ── One VM ─────────────────────────────────────────────────────
    /// The VM must be running at the end.
    Running { vm: VmId },
    /// The VM must be ready (not hosted) at the end.
    Ready { vm: VmId },
    /// The VM must be sleeping at the end.
    Sleeping { vm: VmId },
    /// The VM must be removed from the model.
    Killed { vm: VmId },
    /// The VM must not be relocated.
    Root { vm: VmId },
    /// The VM must not run on any of `nodes`.
    Ban { vm: VmId, nodes: BTreeSet<NodeId> },
    /// The VM may only run on `nodes`.
    Fence { vm: VmId, nodes: BTreeSet<NodeId> },
    /// The VM must get at least `amount` of `resource` where it runs.
    Preserve { vm: VmId, resource: String, amount: u64 },

    // ── One node ───────────────────────────────────────────────────
    Online { node: NodeId },
    Offline { node: NodeId },
    /// No VM may enter or leave the node.
    Quarantine { node: NodeId },
    /// The node's `resource` capacity may be overcommitted by `ratio`.
    Overbook { node: NodeId, resource: String, ratio: f64 },

    // ── Sets of VMs, safe to restrict ──────────────────────────────
    /// No two of these VMs share a host.
    Spread { vms: BTreeSet<VmId> },
    /// These VMs run on hosts that host no other VM.
    Lonely { vms: BTreeSet<VmId> },
    /// Each VM group uses hosts disjoint from the other groups' hosts.
    Split { groups: Vec<BTreeSet<VmId>> },

    // ── Joint semantics, never decomposed ──────────────────────────
    /// These VMs end up on the same host.
    Gather { vms: BTreeSet<VmId> },
    /// At most `amount` of these nodes are online.
    MaxOnline { nodes: BTreeSet<NodeId>, amount: usize },
    /// At most `amount` VMs run on these nodes in total.
    RunningCapacity { nodes: BTreeSet<NodeId>, amount: usize },
    /// These nodes provide at most `amount` of `resource` in total.
    ResourceCapacity {
        nodes: BTreeSet<NodeId>,
        resource: String,
        amount: u64,
    },
    /// The state transitions of these VMs happen one after the other, in order.
    SequentialVmTransitions { vms: Vec<VmId> },

    // ── One group chosen among candidates ──────────────────────────
    /// All running VMs use nodes of the same candidate group.
    Among {
        vms: BTreeSet<VmId>,
        groups: Vec<BTreeSet<NodeId>>,
    },
}

/// Discriminant of [`ConstraintKind`], used to key splitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Running,
    Ready,
    Sleeping,
    Killed,
    Root,
    Ban,
    Fence,
    Preserve,
    Online,
    Offline,
    Quarantine,
    Overbook,
    Spread,
    Lonely,
    Split,
    Gather,
    MaxOnline,
    RunningCapacity,
    ResourceCapacity,
    SequentialVmTransitions,
    Among,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 21] = [
        ConstraintType::Running,
        ConstraintType::Ready,
        ConstraintType::Sleeping,
        ConstraintType::Killed,
        ConstraintType::Root,
        ConstraintType::Ban,
        ConstraintType::Fence,
        ConstraintType::Preserve,
        ConstraintType::Online,
        ConstraintType::Offline,
        ConstraintType::Quarantine,
        ConstraintType::Overbook,
        ConstraintType::Spread,
        ConstraintType::Lonely,
        ConstraintType::Split,
        ConstraintType::Gather,
        ConstraintType::MaxOnline,
        ConstraintType::RunningCapacity,
        ConstraintType::ResourceCapacity,
        ConstraintType::SequentialVmTransitions,
        ConstraintType::Among,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintType::Running => "running",
            ConstraintType::Ready => "ready",
            ConstraintType::Sleeping => "sleeping",
            ConstraintType::Killed => "killed",
            ConstraintType::Root => "root",
            ConstraintType::Ban => "ban",
            ConstraintType::Fence => "fence",
            ConstraintType::Preserve => "preserve",
            ConstraintType::Online => "online",
            ConstraintType::Offline => "offline",
            ConstraintType::Quarantine => "quarantine",
            ConstraintType::Overbook => "overbook",
            ConstraintType::Spread => "spread",
            ConstraintType::Lonely => "lonely",
            ConstraintType::Split => "split",
            ConstraintType::Gather => "gather",
            ConstraintType::MaxOnline => "maxOnline",
            ConstraintType::RunningCapacity => "runningCapacity",
            ConstraintType::ResourceCapacity => "resourceCapacity",
            ConstraintType::SequentialVmTransitions => "sequentialVMTransitions",
            ConstraintType::Among => "among",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ConstraintKind {
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            ConstraintKind::Running { .. } => ConstraintType::Running,
            ConstraintKind::Ready { .. } => ConstraintType::Ready,
            ConstraintKind::Sleeping { .. } => ConstraintType::Sleeping,
            ConstraintKind::Killed { .. } => ConstraintType::Killed,
            ConstraintKind::Root { .. } => ConstraintType::Root,
            ConstraintKind::Ban { .. } => ConstraintType::Ban,
            ConstraintKind::Fence { .. } => ConstraintType::Fence,
            ConstraintKind::Preserve { .. } => ConstraintType::Preserve,
            ConstraintKind::Online { .. } => ConstraintType::Online,
            ConstraintKind::Offline { .. } => ConstraintType::Offline,
            ConstraintKind::Quarantine { .. } => ConstraintType::Quarantine,
            ConstraintKind::Overbook { .. } => ConstraintType::Overbook,
            ConstraintKind::Spread { .. } => ConstraintType::Spread,
            ConstraintKind::Lonely { .. } => ConstraintType::Lonely,
            ConstraintKind::Split { .. } => ConstraintType::Split,
            ConstraintKind::Gather { .. } => ConstraintType::Gather,
            ConstraintKind::MaxOnline { .. } => ConstraintType::MaxOnline,
            ConstraintKind::RunningCapacity { .. } => ConstraintType::RunningCapacity,
            ConstraintKind::ResourceCapacity { .. } => ConstraintType::ResourceCapacity,
            ConstraintKind::SequentialVmTransitions { .. } => {
                ConstraintType::SequentialVmTransitions
            }
            ConstraintKind::Among { .. } => ConstraintType::Among,
        }
    }

    /// VMs named by the constraint. Ordered for sequences, sorted otherwise.
    pub fn involved_vms(&self) -> Vec<VmId> {
        match self {
            ConstraintKind::Running { vm }
            | ConstraintKind::Ready { vm }
            | ConstraintKind::Sleeping { vm }
            | ConstraintKind::Killed { vm }
            | ConstraintKind::Root { vm }
            | ConstraintKind::Ban { vm, .. }
            | ConstraintKind::Fence { vm, .. }
            | ConstraintKind::Preserve { vm, .. } => vec![*vm],
            ConstraintKind::Spread { vms }
            | ConstraintKind::Lonely { vms }
            | ConstraintKind::Gather { vms }
            | ConstraintKind::Among { vms, .. } => vms.iter().copied().collect(),
            ConstraintKind::Split { groups } => {
                let all: BTreeSet<VmId> = groups.iter().flatten().copied().collect();
                all.into_iter().collect()
            }
            ConstraintKind::SequentialVmTransitions { vms } => vms.clone(),
            ConstraintKind::Online { .. }
            | ConstraintKind::Offline { .. }
            | ConstraintKind::Quarantine { .. }
            | ConstraintKind::Overbook { .. }
            | ConstraintKind::MaxOnline { .. }
            | ConstraintKind::RunningCapacity { .. }
            | ConstraintKind::ResourceCapacity { .. } => Vec::new(),
        }
    }

    /// Nodes named by the constraint, sorted.
    pub fn involved_nodes(&self) -> Vec<NodeId> {
        match self {
            ConstraintKind::Online { node }
            | ConstraintKind::Offline { node }
            | ConstraintKind::Quarantine { node }
            | ConstraintKind::Overbook { node, .. } => vec![*node],
            ConstraintKind::Ban { nodes, .. }
            | ConstraintKind::Fence { nodes, .. }
            | ConstraintKind::MaxOnline { nodes, .. }
            | ConstraintKind::RunningCapacity { nodes, .. }
            | ConstraintKind::ResourceCapacity { nodes, .. } => nodes.iter().copied().collect(),
            ConstraintKind::Among { groups, .. } => {
                let all: BTreeSet<NodeId> = groups.iter().flatten().copied().collect();
                all.into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Kinds that only make sense as continuous restrictions.
    fn always_continuous(&self) -> bool {
        matches!(
            self,
            ConstraintKind::Quarantine { .. } | ConstraintKind::SequentialVmTransitions { .. }
        )
    }
}

/// A constraint to satisfy: what it restricts and when it must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub continuous: bool,
}

impl Constraint {
    /// A discrete constraint, except for kinds that are continuous by nature.
    pub fn new(kind: ConstraintKind) -> Self {
        let continuous = kind.always_continuous();
        Self { kind, continuous }
    }

    pub fn continuous(kind: ConstraintKind) -> Self {
        Self {
            kind,
            continuous: true,
        }
    }

    /// A new constraint of another kind with the same satisfaction mode.
    pub fn derive(&self, kind: ConstraintKind) -> Self {
        Self {
            kind,
            continuous: self.continuous,
        }
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.kind.constraint_type()
    }

    /// One `Running` constraint per VM.
    pub fn running_all(vms: impl IntoIterator<Item = VmId>) -> Vec<Constraint> {
        vms.into_iter()
            .map(|vm| Constraint::new(ConstraintKind::Running { vm }))
            .collect()
    }
}

fn write_set<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, it) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{it}")?;
    }
    f.write_str("]")
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.constraint_type())?;
        match &self.kind {
            ConstraintKind::Running { vm }
            | ConstraintKind::Ready { vm }
            | ConstraintKind::Sleeping { vm }
            | ConstraintKind::Killed { vm }
            | ConstraintKind::Root { vm } => write!(f, "vm={vm}")?,
            ConstraintKind::Ban { vm, nodes } | ConstraintKind::Fence { vm, nodes } => {
                write!(f, "vm={vm}, nodes=")?;
                write_set(f, nodes)?;
            }
            ConstraintKind::Preserve { vm, resource, amount } => {
                write!(f, "vm={vm}, rc={resource}, amount={amount}")?
            }
            ConstraintKind::Online { node }
            | ConstraintKind::Offline { node }
            | ConstraintKind::Quarantine { node } => write!(f, "node={node}")?,
            ConstraintKind::Overbook { node, resource, ratio } => {
                write!(f, "node={node}, rc={resource}, ratio={ratio}")?
            }
            ConstraintKind::Spread { vms }
            | ConstraintKind::Lonely { vms }
            | ConstraintKind::Gather { vms } => {
                f.write_str("vms=")?;
                write_set(f, vms)?;
            }
            ConstraintKind::SequentialVmTransitions { vms } => {
                f.write_str("vms=")?;
                write_set(f, vms)?;
            }
            ConstraintKind::Split { groups } => {
                f.write_str("vms=[")?;
                for (i, g) in groups.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_set(f, g)?;
                }
                f.write_str("]")?;
            }
            ConstraintKind::MaxOnline { nodes, amount }
            | ConstraintKind::RunningCapacity { nodes, amount } => {
                f.write_str("nodes=")?;
                write_set(f, nodes)?;
                write!(f, ", amount={amount}")?;
            }
            ConstraintKind::ResourceCapacity {
                nodes,
                resource,
                amount,
            } => {
                f.write_str("nodes=")?;
                write_set(f, nodes)?;
                write!(f, ", rc={resource}, amount={amount}")?;
            }
            ConstraintKind::Among { vms, groups } => {
                f.write_str("vms=")?;
                write_set(f, vms)?;
                f.write_str(", nodes=[")?;
                for (i, g) in groups.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_set(f, g)?;
                }
                f.write_str("]")?;
            }
        }
        let mode = if self.continuous { "continuous" } else { "discrete" };
        write!(f, ", {mode})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_a_listed_type() {
        let samples = vec![
            ConstraintKind::Running { vm: VmId(0) },
            ConstraintKind::Gather { vms: BTreeSet::new() },
            ConstraintKind::Among {
                vms: BTreeSet::new(),
                groups: Vec::new(),
            },
        ];
        for k in samples {
            assert!(ConstraintType::ALL.contains(&k.constraint_type()));
        }
    }

    #[test]
    fn sequences_keep_their_order() {
        let k = ConstraintKind::SequentialVmTransitions {
            vms: vec![VmId(3), VmId(1), VmId(2)],
        };
        assert_eq!(k.involved_vms(), vec![VmId(3), VmId(1), VmId(2)]);
    }

    #[test]
    fn some_kinds_are_always_continuous() {
        let q = Constraint::new(ConstraintKind::Quarantine { node: NodeId(0) });
        assert!(q.continuous);
        let r = Constraint::new(ConstraintKind::Running { vm: VmId(0) });
        assert!(!r.continuous);
    }

    #[test]
    fn derive_keeps_the_satisfaction_mode() {
        let c = Constraint::continuous(ConstraintKind::Spread {
            vms: [VmId(0), VmId(1), VmId(2)].into(),
        });
        let d = c.derive(ConstraintKind::Spread {
            vms: [VmId(0), VmId(1)].into(),
        });
        assert!(d.continuous);
        assert_eq!(c.kind.involved_vms().len(), 3);
    }

    #[test]
    fn among_involves_every_candidate_node() {
        let k = ConstraintKind::Among {
            vms: [VmId(0)].into(),
            groups: vec![[NodeId(1), NodeId(2)].into(), [NodeId(0)].into()],
        };
        assert_eq!(k.involved_nodes(), vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn display_is_readable() {
        let c = Constraint::new(ConstraintKind::Ban {
            vm: VmId(1),
            nodes: [NodeId(0), NodeId(2)].into(),
        });
        assert_eq!(c.to_string(), "ban(vm=vm1, nodes=[n0, n2], discrete)");
    }

    #[test]
    fn json_is_internally_tagged() {
        let c = Constraint::new(ConstraintKind::Offline { node: NodeId(4) });
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"type":"offline","node":4,"continuous":false}"#);
        let back: Constraint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
