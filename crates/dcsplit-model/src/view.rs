//! Optional model decorations: resource views and element attributes.
//!
//! Both are keyed by element and can be narrowed to the elements of a
//! partition, so each partition carries only its own slice.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, VmId};

/// A resource shared between VMs (cpu, memory, ...): node capacities
/// and VM consumptions, with defaults for unlisted elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareableResource {
    pub id: String,
    #[serde(default)]
    pub default_capacity: u64,
    #[serde(default)]
    pub default_consumption: u64,
    #[serde(default)]
    pub capacities: BTreeMap<NodeId, u64>,
    #[serde(default)]
    pub consumptions: BTreeMap<VmId, u64>,
}

impl ShareableResource {
    pub fn new(id: &str, default_capacity: u64, default_consumption: u64) -> Self {
        Self {
            id: id.to_string(),
            default_capacity,
            default_consumption,
            capacities: BTreeMap::new(),
            consumptions: BTreeMap::new(),
        }
    }

    pub fn set_capacity(&mut self, n: NodeId, amount: u64) -> &mut Self {
        self.capacities.insert(n, amount);
        self
    }

    pub fn set_consumption(&mut self, v: VmId, amount: u64) -> &mut Self {
        self.consumptions.insert(v, amount);
        self
    }

    pub fn capacity(&self, n: NodeId) -> u64 {
        self.capacities.get(&n).copied().unwrap_or(self.default_capacity)
    }

    pub fn consumption(&self, v: VmId) -> u64 {
        self.consumptions
            .get(&v)
            .copied()
            .unwrap_or(self.default_consumption)
    }

    /// Copy of this view limited to the given elements.
    pub fn restrict(&self, nodes: &BTreeSet<NodeId>, vms: &BTreeSet<VmId>) -> Self {
        Self {
            id: self.id.clone(),
            default_capacity: self.default_capacity,
            default_consumption: self.default_consumption,
            capacities: self
                .capacities
                .iter()
                .filter(|(n, _)| nodes.contains(n))
                .map(|(n, a)| (*n, *a))
                .collect(),
            consumptions: self
                .consumptions
                .iter()
                .filter(|(v, _)| vms.contains(v))
                .map(|(v, a)| (*v, *a))
                .collect(),
        }
    }
}

/// A free-form attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

/// Per-element key/value attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    nodes: BTreeMap<NodeId, BTreeMap<String, AttrValue>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    vms: BTreeMap<VmId, BTreeMap<String, AttrValue>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&mut self, n: NodeId, key: &str, value: AttrValue) -> Option<AttrValue> {
        self.nodes.entry(n).or_default().insert(key.to_string(), value)
    }

    pub fn put_vm(&mut self, v: VmId, key: &str, value: AttrValue) -> Option<AttrValue> {
        self.vms.entry(v).or_default().insert(key.to_string(), value)
    }

    pub fn node(&self, n: NodeId, key: &str) -> Option<&AttrValue> {
        self.nodes.get(&n).and_then(|m| m.get(key))
    }

    pub fn vm(&self, v: VmId, key: &str) -> Option<&AttrValue> {
        self.vms.get(&v).and_then(|m| m.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.vms.is_empty()
    }

    pub fn restrict(&self, nodes: &BTreeSet<NodeId>, vms: &BTreeSet<VmId>) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|(n, _)| nodes.contains(n))
                .map(|(n, m)| (*n, m.clone()))
                .collect(),
            vms: self
                .vms
                .iter()
                .filter(|(v, _)| vms.contains(v))
                .map(|(v, m)| (*v, m.clone()))
                .collect(),
        }
    }
}
