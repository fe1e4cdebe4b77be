//! Element identifiers for the datacenter model.
//!
//! Nodes and VMs are opaque integer identifiers. They carry no state on
//! their own: everything about an element (its placement, its resource
//! usage, its attributes) lives in the [`Model`](crate::Model) that
//! references it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a physical host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Identifier of a virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm{}", self.0)
    }
}

/// Either kind of element. Used where nodes and VMs share a keyspace
/// (attributes, error reports, position lookups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Element {
    Node(NodeId),
    Vm(VmId),
}

impl From<NodeId> for Element {
    fn from(n: NodeId) -> Self {
        Element::Node(n)
    }
}

impl From<VmId> for Element {
    fn from(v: VmId) -> Self {
        Element::Vm(v)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Node(n) => n.fmt(f),
            Element::Vm(v) => v.fmt(f),
        }
    }
}
