//! A mapping plus its optional decorations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::mapping::Mapping;
use crate::types::{NodeId, VmId};
use crate::view::{Attributes, ShareableResource};

/// The datacenter model: placement state, resource views, attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub mapping: Mapping,
    /// Resource views keyed by resource identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, ShareableResource>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mapping: Mapping) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    /// Attach a resource view. Refused if a view with the same id exists.
    pub fn attach(&mut self, view: ShareableResource) -> bool {
        if self.views.contains_key(&view.id) {
            return false;
        }
        self.views.insert(view.id.clone(), view);
        true
    }

    pub fn view(&self, id: &str) -> Option<&ShareableResource> {
        self.views.get(id)
    }

    pub fn contains_node(&self, n: NodeId) -> bool {
        self.mapping.contains_node(n)
    }

    pub fn contains_vm(&self, v: VmId) -> bool {
        self.mapping.contains_vm(v)
    }

    /// Build the independent slice of this model made of `nodes`, the
    /// VMs they host, and the `ready` VMs. Views and attributes follow.
    pub fn restrict(&self, nodes: &BTreeSet<NodeId>, ready: &BTreeSet<VmId>) -> Model {
        let mapping = self.mapping.restrict(nodes, ready);
        let kept_nodes: BTreeSet<NodeId> = mapping.nodes().collect();
        let kept_vms: BTreeSet<VmId> = mapping.vms().collect();

        Model {
            views: self
                .views
                .iter()
                .map(|(id, v)| (id.clone(), v.restrict(&kept_nodes, &kept_vms)))
                .collect(),
            attributes: self.attributes.restrict(&kept_nodes, &kept_vms),
            mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::AttrValue;

    #[test]
    fn attach_rejects_duplicate_views() {
        let mut mo = Model::new();
        assert!(mo.attach(ShareableResource::new("cpu", 4, 1)));
        assert!(!mo.attach(ShareableResource::new("cpu", 8, 1)));
        assert_eq!(mo.view("cpu").map(|v| v.default_capacity), Some(4));
    }

    #[test]
    fn restrict_carries_views_and_attributes() {
        let mut mo = Model::new();
        mo.mapping.add_online_node(NodeId(0));
        mo.mapping.add_online_node(NodeId(1));
        mo.mapping.add_running_vm(VmId(0), NodeId(0));
        mo.mapping.add_running_vm(VmId(1), NodeId(1));

        let mut rc = ShareableResource::new("cpu", 4, 1);
        rc.set_consumption(VmId(0), 2).set_consumption(VmId(1), 3);
        mo.attach(rc);
        mo.attributes.put_vm(VmId(1), "boot", AttrValue::Int(5));

        let sub = mo.restrict(&[NodeId(1)].into(), &BTreeSet::new());

        assert!(sub.contains_vm(VmId(1)));
        assert!(!sub.contains_vm(VmId(0)));
        let cpu = sub.view("cpu").unwrap();
        assert_eq!(cpu.consumption(VmId(1)), 3);
        assert!(!cpu.consumptions.contains_key(&VmId(0)));
        assert_eq!(sub.attributes.vm(VmId(1), "boot"), Some(&AttrValue::Int(5)));
    }
}
