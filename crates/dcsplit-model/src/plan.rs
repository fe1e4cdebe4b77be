//! Reconfiguration plans: time-stamped actions over an origin model.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::mapping::Mapping;
use crate::model::Model;
use crate::types::{NodeId, VmId};

/// A state-changing operation on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActionKind {
    BootNode { node: NodeId },
    ShutdownNode { node: NodeId },
    BootVm { vm: VmId, node: NodeId },
    ShutdownVm { vm: VmId, node: NodeId },
    MigrateVm { vm: VmId, from: NodeId, to: NodeId },
    SuspendVm { vm: VmId, from: NodeId, to: NodeId },
    ResumeVm { vm: VmId, from: NodeId, to: NodeId },
}

/// The element whose state an action changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Node(NodeId),
    Vm(VmId),
}

impl ActionKind {
    fn subject(&self) -> Subject {
        match self {
            ActionKind::BootNode { node } | ActionKind::ShutdownNode { node } => {
                Subject::Node(*node)
            }
            ActionKind::BootVm { vm, .. }
            | ActionKind::ShutdownVm { vm, .. }
            | ActionKind::MigrateVm { vm, .. }
            | ActionKind::SuspendVm { vm, .. }
            | ActionKind::ResumeVm { vm, .. } => Subject::Vm(*vm),
        }
    }

    /// The VM this action manipulates, if any.
    pub fn vm(&self) -> Option<VmId> {
        match self.subject() {
            Subject::Vm(v) => Some(v),
            Subject::Node(_) => None,
        }
    }

    /// Every node the action touches.
    pub fn nodes(&self) -> Vec<NodeId> {
        match *self {
            ActionKind::BootNode { node }
            | ActionKind::ShutdownNode { node }
            | ActionKind::BootVm { node, .. }
            | ActionKind::ShutdownVm { node, .. } => vec![node],
            ActionKind::MigrateVm { from, to, .. }
            | ActionKind::SuspendVm { from, to, .. }
            | ActionKind::ResumeVm { from, to, .. } => vec![from, to],
        }
    }

    /// Apply the state change. Returns `false` and leaves the mapping
    /// untouched when the precondition does not hold.
    pub fn apply(&self, m: &mut Mapping) -> bool {
        match *self {
            ActionKind::BootNode { node } => m.is_offline(node) && m.add_online_node(node),
            ActionKind::ShutdownNode { node } => m.is_online(node) && m.add_offline_node(node),
            ActionKind::BootVm { vm, node } => m.is_ready(vm) && m.add_running_vm(vm, node),
            ActionKind::ShutdownVm { vm, node } => {
                m.vm_location(vm) == Some(node) && m.is_running(vm) && m.add_ready_vm(vm)
            }
            ActionKind::MigrateVm { vm, from, to } => {
                m.vm_location(vm) == Some(from) && m.is_running(vm) && m.add_running_vm(vm, to)
            }
            ActionKind::SuspendVm { vm, from, to } => {
                m.vm_location(vm) == Some(from) && m.is_running(vm) && m.add_sleeping_vm(vm, to)
            }
            ActionKind::ResumeVm { vm, from, to } => {
                m.vm_location(vm) == Some(from) && m.is_sleeping(vm) && m.add_running_vm(vm, to)
            }
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::BootNode { node } => write!(f, "bootNode(node={node})"),
            ActionKind::ShutdownNode { node } => write!(f, "shutdownNode(node={node})"),
            ActionKind::BootVm { vm, node } => write!(f, "bootVM(vm={vm}, on={node})"),
            ActionKind::ShutdownVm { vm, node } => write!(f, "shutdownVM(vm={vm}, on={node})"),
            ActionKind::MigrateVm { vm, from, to } => {
                write!(f, "migrate(vm={vm}, from={from}, to={to})")
            }
            ActionKind::SuspendVm { vm, from, to } => {
                write!(f, "suspend(vm={vm}, from={from}, to={to})")
            }
            ActionKind::ResumeVm { vm, from, to } => {
                write!(f, "resume(vm={vm}, from={from}, to={to})")
            }
        }
    }
}

/// An action scheduled over `[start, end]`.
///
/// Ordering is (start, end, kind), which is the execution order of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action {
    pub start: u32,
    pub end: u32,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(start: u32, end: u32, kind: ActionKind) -> Self {
        Self { start, end, kind }
    }

    fn overlaps(&self, other: &Action) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.start, self.end, self.kind)
    }
}

/// An origin model and the ordered actions that transform it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconfigurationPlan {
    origin: Model,
    actions: Vec<Action>,
}

impl ReconfigurationPlan {
    /// An empty plan over `origin`.
    pub fn new(origin: Model) -> Self {
        Self {
            origin,
            actions: Vec::new(),
        }
    }

    pub fn origin(&self) -> &Model {
        &self.origin
    }

    /// Insert an action at its place in the schedule.
    ///
    /// Refused when the action is already present, is not a valid
    /// interval, names an element the origin does not know, or overlaps
    /// in time another action on the same element.
    pub fn add(&mut self, a: Action) -> bool {
        if a.start > a.end || !self.knows(&a.kind) {
            debug!(action = %a, "refusing malformed or foreign action");
            return false;
        }
        let pos = match self.actions.binary_search(&a) {
            Ok(_) => {
                debug!(action = %a, "refusing duplicate action");
                return false;
            }
            Err(pos) => pos,
        };
        let subject = a.kind.subject();
        if self
            .actions
            .iter()
            .any(|b| b.kind.subject() == subject && b.overlaps(&a))
        {
            debug!(action = %a, "refusing overlapping action");
            return false;
        }
        self.actions.insert(pos, a);
        true
    }

    pub fn size(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Moment the last action ends.
    pub fn duration(&self) -> u32 {
        self.actions.iter().map(|a| a.end).max().unwrap_or(0)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// The model obtained by applying every action in order.
    pub fn result(&self) -> ModelResult<Model> {
        let mut mo = self.origin.clone();
        for a in &self.actions {
            if !a.kind.apply(&mut mo.mapping) {
                return Err(ModelError::InapplicableAction { action: *a });
            }
        }
        Ok(mo)
    }

    fn knows(&self, kind: &ActionKind) -> bool {
        let m = &self.origin.mapping;
        kind.vm().is_none_or(|v| m.contains_vm(v)) && kind.nodes().iter().all(|n| m.contains_node(*n))
    }
}

impl<'a> IntoIterator for &'a ReconfigurationPlan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl fmt::Display for ReconfigurationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in &self.actions {
            writeln!(f, "{a}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Model {
        let mut mo = Model::new();
        mo.mapping.add_online_node(NodeId(0));
        mo.mapping.add_offline_node(NodeId(1));
        mo.mapping.add_ready_vm(VmId(0));
        mo.mapping.add_running_vm(VmId(1), NodeId(0));
        mo
    }

    #[test]
    fn actions_are_kept_in_schedule_order() {
        let mut plan = ReconfigurationPlan::new(origin());
        assert!(plan.add(Action::new(3, 5, ActionKind::BootVm { vm: VmId(0), node: NodeId(1) })));
        assert!(plan.add(Action::new(0, 3, ActionKind::BootNode { node: NodeId(1) })));

        let starts: Vec<u32> = plan.iter().map(|a| a.start).collect();
        assert_eq!(starts, vec![0, 3]);
        assert_eq!(plan.duration(), 5);

        let res = plan.result().unwrap();
        assert!(res.mapping.is_online(NodeId(1)));
        assert_eq!(res.mapping.vm_location(VmId(0)), Some(NodeId(1)));
    }

    #[test]
    fn duplicates_are_refused() {
        let mut plan = ReconfigurationPlan::new(origin());
        let a = Action::new(0, 2, ActionKind::BootNode { node: NodeId(1) });
        assert!(plan.add(a));
        assert!(!plan.add(a));
        assert_eq!(plan.size(), 1);
    }

    #[test]
    fn overlapping_actions_on_one_vm_are_refused() {
        let mut plan = ReconfigurationPlan::new(origin());
        assert!(plan.add(Action::new(0, 4, ActionKind::MigrateVm {
            vm: VmId(1),
            from: NodeId(0),
            to: NodeId(1),
        })));
        assert!(!plan.add(Action::new(2, 6, ActionKind::ShutdownVm { vm: VmId(1), node: NodeId(1) })));
        // Back to back is fine.
        assert!(plan.add(Action::new(4, 6, ActionKind::ShutdownVm { vm: VmId(1), node: NodeId(1) })));
    }

    #[test]
    fn unknown_elements_are_refused() {
        let mut plan = ReconfigurationPlan::new(origin());
        assert!(!plan.add(Action::new(0, 1, ActionKind::BootVm { vm: VmId(7), node: NodeId(0) })));
        assert!(!plan.add(Action::new(0, 1, ActionKind::BootNode { node: NodeId(9) })));
        assert!(!plan.add(Action::new(3, 1, ActionKind::BootNode { node: NodeId(1) })));
    }

    #[test]
    fn result_reports_inapplicable_actions() {
        let mut plan = ReconfigurationPlan::new(origin());
        // n1 is offline: booting a VM there cannot happen.
        plan.add(Action::new(0, 1, ActionKind::BootVm { vm: VmId(0), node: NodeId(1) }));
        let err = plan.result().unwrap_err();
        assert!(matches!(err, ModelError::InapplicableAction { .. }));
    }

    #[test]
    fn suspend_then_resume() {
        let mut plan = ReconfigurationPlan::new(origin());
        plan.add(Action::new(0, 1, ActionKind::SuspendVm { vm: VmId(1), from: NodeId(0), to: NodeId(0) }));
        plan.add(Action::new(1, 2, ActionKind::ResumeVm { vm: VmId(1), from: NodeId(0), to: NodeId(0) }));
        let res = plan.result().unwrap();
        assert!(res.mapping.is_running(VmId(1)));
    }

    #[test]
    fn display_lists_actions() {
        let mut plan = ReconfigurationPlan::new(origin());
        plan.add(Action::new(0, 1, ActionKind::BootVm { vm: VmId(0), node: NodeId(0) }));
        assert_eq!(plan.to_string(), "0:1 bootVM(vm=vm0, on=n0)\n");
    }
}
