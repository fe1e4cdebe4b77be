//! Placement state of every node and VM at one instant.
//!
//! A [`Mapping`] keeps the forward view (VM → state) and a reverse host
//! index (node → hosted VMs) in sync. Mutators refuse any change that
//! would break the placement invariant instead of panicking:
//!
//! - a VM is running or sleeping on at most one node;
//! - a node hosts VMs only while it is online.
//!
//! Enumeration is always sorted by identifier, which gives every caller
//! a stable visiting order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{NodeId, VmId};

/// Power state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Online,
    Offline,
}

/// Lifecycle state of a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    /// Known but not hosted anywhere yet.
    Ready,
    Running(NodeId),
    Sleeping(NodeId),
}

impl VmState {
    /// The hosting node, if any.
    pub fn host(&self) -> Option<NodeId> {
        match self {
            VmState::Ready => None,
            VmState::Running(n) | VmState::Sleeping(n) => Some(*n),
        }
    }
}

/// State assignment of all nodes and VMs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "MappingRepr", into = "MappingRepr")]
pub struct Mapping {
    nodes: BTreeMap<NodeId, NodeState>,
    vms: BTreeMap<VmId, VmState>,
    /// Reverse index: node → VMs running or sleeping on it.
    hosted: BTreeMap<NodeId, BTreeSet<VmId>>,
}

// The host index is derived data and may hold empty sets after moves.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.vms == other.vms
    }
}

impl Eq for Mapping {}

/// Wire form of a [`Mapping`]; the host index is derived on load.
#[derive(Serialize, Deserialize)]
struct MappingRepr {
    #[serde(default)]
    nodes: BTreeMap<NodeId, NodeState>,
    #[serde(default)]
    vms: BTreeMap<VmId, VmState>,
}

impl From<Mapping> for MappingRepr {
    fn from(m: Mapping) -> Self {
        MappingRepr {
            nodes: m.nodes,
            vms: m.vms,
        }
    }
}

impl TryFrom<MappingRepr> for Mapping {
    type Error = ModelError;

    fn try_from(r: MappingRepr) -> Result<Self, Self::Error> {
        let mut m = Mapping::new();
        for (n, st) in r.nodes {
            m.nodes.insert(n, st);
        }
        for (v, st) in r.vms {
            let accepted = match st {
                VmState::Ready => m.add_ready_vm(v),
                VmState::Running(n) => m.add_running_vm(v, n),
                VmState::Sleeping(n) => m.add_sleeping_vm(v, n),
            };
            if !accepted {
                return Err(ModelError::Invalid(format!(
                    "{v} is hosted on {}, which is not an online node",
                    st.host().map_or_else(|| "nothing".to_string(), |n| n.to_string())
                )));
            }
        }
        Ok(m)
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Set a node online, registering it if needed.
    pub fn add_online_node(&mut self, n: NodeId) -> bool {
        self.nodes.insert(n, NodeState::Online);
        true
    }

    /// Set a node offline. Refused while the node hosts VMs.
    pub fn add_offline_node(&mut self, n: NodeId) -> bool {
        if self.hosted.get(&n).is_some_and(|s| !s.is_empty()) {
            return false;
        }
        self.nodes.insert(n, NodeState::Offline);
        true
    }

    /// Forget a node. Refused while the node hosts VMs.
    pub fn remove_node(&mut self, n: NodeId) -> bool {
        if self.hosted.get(&n).is_some_and(|s| !s.is_empty()) {
            return false;
        }
        self.hosted.remove(&n);
        self.nodes.remove(&n).is_some()
    }

    pub fn node_state(&self, n: NodeId) -> Option<NodeState> {
        self.nodes.get(&n).copied()
    }

    pub fn contains_node(&self, n: NodeId) -> bool {
        self.nodes.contains_key(&n)
    }

    pub fn is_online(&self, n: NodeId) -> bool {
        self.node_state(n) == Some(NodeState::Online)
    }

    pub fn is_offline(&self, n: NodeId) -> bool {
        self.node_state(n) == Some(NodeState::Offline)
    }

    /// Every node, in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn online_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, st)| **st == NodeState::Online)
            .map(|(n, _)| *n)
    }

    pub fn offline_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, st)| **st == NodeState::Offline)
            .map(|(n, _)| *n)
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    // ── VMs ────────────────────────────────────────────────────────

    /// Set a VM ready, detaching it from its current host if any.
    pub fn add_ready_vm(&mut self, v: VmId) -> bool {
        self.detach(v);
        self.vms.insert(v, VmState::Ready);
        true
    }

    /// Set a VM running on `n`. Refused unless `n` is online.
    pub fn add_running_vm(&mut self, v: VmId, n: NodeId) -> bool {
        self.host_vm(v, VmState::Running(n))
    }

    /// Set a VM sleeping on `n`. Refused unless `n` is online.
    pub fn add_sleeping_vm(&mut self, v: VmId, n: NodeId) -> bool {
        self.host_vm(v, VmState::Sleeping(n))
    }

    /// Forget a VM.
    pub fn remove_vm(&mut self, v: VmId) -> bool {
        self.detach(v);
        self.vms.remove(&v).is_some()
    }

    pub fn vm_state(&self, v: VmId) -> Option<VmState> {
        self.vms.get(&v).copied()
    }

    pub fn contains_vm(&self, v: VmId) -> bool {
        self.vms.contains_key(&v)
    }

    pub fn vm_location(&self, v: VmId) -> Option<NodeId> {
        self.vm_state(v).and_then(|st| st.host())
    }

    pub fn is_ready(&self, v: VmId) -> bool {
        self.vm_state(v) == Some(VmState::Ready)
    }

    pub fn is_running(&self, v: VmId) -> bool {
        matches!(self.vm_state(v), Some(VmState::Running(_)))
    }

    pub fn is_sleeping(&self, v: VmId) -> bool {
        matches!(self.vm_state(v), Some(VmState::Sleeping(_)))
    }

    /// Every VM, in identifier order.
    pub fn vms(&self) -> impl Iterator<Item = VmId> + '_ {
        self.vms.keys().copied()
    }

    pub fn ready_vms(&self) -> impl Iterator<Item = VmId> + '_ {
        self.vms
            .iter()
            .filter(|(_, st)| **st == VmState::Ready)
            .map(|(v, _)| *v)
    }

    pub fn running_vms(&self) -> impl Iterator<Item = VmId> + '_ {
        self.vms
            .iter()
            .filter(|(_, st)| matches!(st, VmState::Running(_)))
            .map(|(v, _)| *v)
    }

    pub fn sleeping_vms(&self) -> impl Iterator<Item = VmId> + '_ {
        self.vms
            .iter()
            .filter(|(_, st)| matches!(st, VmState::Sleeping(_)))
            .map(|(v, _)| *v)
    }

    /// VMs running or sleeping on `n`.
    pub fn hosted_vms(&self, n: NodeId) -> impl Iterator<Item = VmId> + '_ {
        self.hosted.get(&n).into_iter().flatten().copied()
    }

    pub fn running_vms_on(&self, n: NodeId) -> impl Iterator<Item = VmId> + '_ {
        self.hosted_vms(n).filter(move |v| self.is_running(*v))
    }

    pub fn sleeping_vms_on(&self, n: NodeId) -> impl Iterator<Item = VmId> + '_ {
        self.hosted_vms(n).filter(move |v| self.is_sleeping(*v))
    }

    pub fn nb_vms(&self) -> usize {
        self.vms.len()
    }

    // ── Slicing ────────────────────────────────────────────────────

    /// Build an independent mapping holding `nodes`, the VMs they host,
    /// and the `ready` VMs. Elements unknown to `self` are skipped.
    pub fn restrict(&self, nodes: &BTreeSet<NodeId>, ready: &BTreeSet<VmId>) -> Mapping {
        let mut sub = Mapping::new();
        for n in nodes {
            let Some(st) = self.node_state(*n) else { continue };
            sub.nodes.insert(*n, st);
            for v in self.hosted_vms(*n) {
                if let Some(vst) = self.vm_state(v) {
                    sub.host_vm(v, vst);
                }
            }
        }
        for v in ready {
            if self.contains_vm(*v) {
                sub.add_ready_vm(*v);
            }
        }
        sub
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn host_vm(&mut self, v: VmId, st: VmState) -> bool {
        let Some(n) = st.host() else {
            return self.add_ready_vm(v);
        };
        if !self.is_online(n) {
            return false;
        }
        self.detach(v);
        self.vms.insert(v, st);
        self.hosted.entry(n).or_default().insert(v);
        true
    }

    fn detach(&mut self, v: VmId) {
        if let Some(host) = self.vm_location(v) {
            if let Some(set) = self.hosted.get_mut(&host) {
                set.remove(&v);
            }
        }
    }
}
