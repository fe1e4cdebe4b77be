//! Partition builders.
//!
//! A builder turns node groups into disjoint sub-instances: each partition
//! receives its nodes, the VMs they host and a share of the ready VMs, then
//! every constraint of the origin is localized through the registry.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use dcsplit_model::{Instance, NodeId, Parameters, VmId};

use crate::error::{SplitError, SplitResult};
use crate::index::Positions;
use crate::registry::SplitterRegistry;

/// Splits an instance into disjoint sub-instances.
pub trait Partitioner: Send + Sync {
    fn split(&self, ps: &Parameters, instance: &Instance) -> SplitResult<Vec<Instance>>;
}

/// Partitions given as explicit node groups.
#[derive(Debug, Clone)]
pub struct NodeSetsPartitioning {
    groups: Vec<BTreeSet<NodeId>>,
    registry: SplitterRegistry,
}

impl NodeSetsPartitioning {
    pub fn new(groups: Vec<BTreeSet<NodeId>>) -> Self {
        Self {
            groups,
            registry: SplitterRegistry::default(),
        }
    }

    pub fn with_registry(mut self, registry: SplitterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn groups(&self) -> &[BTreeSet<NodeId>] {
        &self.groups
    }

    pub fn registry_mut(&mut self) -> &mut SplitterRegistry {
        &mut self.registry
    }
}

impl Partitioner for NodeSetsPartitioning {
    fn split(&self, _ps: &Parameters, instance: &Instance) -> SplitResult<Vec<Instance>> {
        split_groups(&self.groups, &self.registry, instance)
    }
}

/// Groups of at most `size` nodes, taken in id order or at random.
#[derive(Debug, Clone)]
pub struct FixedSizePartitioning {
    size: usize,
    random: bool,
    registry: SplitterRegistry,
}

impl FixedSizePartitioning {
    pub fn new(size: usize) -> SplitResult<Self> {
        if size == 0 {
            return Err(SplitError::InvalidSize);
        }
        Ok(Self {
            size,
            random: false,
            registry: SplitterRegistry::default(),
        })
    }

    /// Pick nodes at random, seeded from the run parameters.
    pub fn random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    pub fn with_registry(mut self, registry: SplitterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn registry_mut(&mut self) -> &mut SplitterRegistry {
        &mut self.registry
    }

    /// The node groups this builder would use.
    pub fn groups(&self, ps: &Parameters, instance: &Instance) -> Vec<BTreeSet<NodeId>> {
        let mut nodes: Vec<NodeId> = instance.model.mapping.nodes().collect();
        if self.random {
            let mut rng = StdRng::seed_from_u64(ps.random_seed);
            nodes.shuffle(&mut rng);
        }
        nodes
            .chunks(self.size)
            .map(|c| c.iter().copied().collect())
            .collect()
    }
}

impl Partitioner for FixedSizePartitioning {
    fn split(&self, ps: &Parameters, instance: &Instance) -> SplitResult<Vec<Instance>> {
        let groups = self.groups(ps, instance);
        debug!(
            size = self.size,
            random = self.random,
            seed = ps.random_seed,
            groups = groups.len(),
            "fixed-size grouping computed"
        );
        split_groups(&groups, &self.registry, instance)
    }
}

/// Check that `groups` are non-empty, disjoint, name known nodes and
/// cover every node of the origin. Returns node -> group.
fn node_positions(
    groups: &[BTreeSet<NodeId>],
    instance: &Instance,
) -> SplitResult<BTreeMap<NodeId, usize>> {
    let mapping = &instance.model.mapping;
    let mut owner: BTreeMap<NodeId, usize> = BTreeMap::new();
    for (g, nodes) in groups.iter().enumerate() {
        if nodes.is_empty() {
            return Err(SplitError::EmptyGroup(g));
        }
        for &n in nodes {
            if !mapping.contains_node(n) {
                return Err(SplitError::UnknownNode(n));
            }
            if let Some(first) = owner.insert(n, g) {
                return Err(SplitError::OverlappingGroups {
                    node: n,
                    first,
                    second: g,
                });
            }
        }
    }
    if let Some(n) = mapping.nodes().find(|n| !owner.contains_key(n)) {
        return Err(SplitError::UncoveredNode(n));
    }
    Ok(owner)
}

fn split_groups(
    groups: &[BTreeSet<NodeId>],
    registry: &SplitterRegistry,
    origin: &Instance,
) -> SplitResult<Vec<Instance>> {
    if groups.is_empty() {
        return Err(SplitError::NoPartition);
    }
    let owner = node_positions(groups, origin)?;

    // Ready VMs are dealt round-robin in id order.
    let mut ready: Vec<BTreeSet<VmId>> = vec![BTreeSet::new(); groups.len()];
    for (i, v) in origin.model.mapping.ready_vms().enumerate() {
        ready[i % groups.len()].insert(v);
    }

    let mut positions = Positions::default();
    for (n, g) in owner {
        positions.nodes.insert(n, g);
    }
    let mut parts: Vec<Instance> = Vec::with_capacity(groups.len());
    for (p, (nodes, ready)) in groups.iter().zip(&ready).enumerate() {
        let model = origin.model.restrict(nodes, ready);
        for v in model.mapping.vms() {
            positions.vms.insert(v, p);
        }
        parts.push(Instance::empty(model, origin.objective));
    }

    for c in &origin.constraints {
        registry.split(c, &positions, &mut parts)?;
    }

    for (p, part) in parts.iter().enumerate() {
        debug!(
            partition = p,
            nodes = part.model.mapping.nb_nodes(),
            vms = part.model.mapping.nb_vms(),
            constraints = part.constraints.len(),
            "partition built"
        );
    }
    info!(
        partitions = parts.len(),
        nodes = origin.model.mapping.nb_nodes(),
        vms = origin.model.mapping.nb_vms(),
        constraints = origin.constraints.len(),
        "instance split"
    );
    Ok(parts)
}
