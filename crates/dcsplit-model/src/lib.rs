//! dcsplit-model: datacenter model for the partitioning scheduler.
//!
//! A [`Model`] is a [`Mapping`] (which node is online, where each VM runs)
//! decorated with resource views and attributes. An [`Instance`] pairs a
//! model with placement [`Constraint`]s and an [`Objective`]; solving one
//! yields a [`ReconfigurationPlan`].
//!
//! # Identifiers
//!
//! Nodes and VMs are dense integer ids ([`NodeId`], [`VmId`]). Ids are
//! global: a partition of a model reuses the ids of the original, which is
//! what makes merging per-partition plans back into one plan possible.

pub mod constraint;
pub mod error;
pub mod instance;
pub mod mapping;
pub mod model;
pub mod params;
pub mod plan;
pub mod types;
pub mod view;

pub use constraint::{Constraint, ConstraintKind, ConstraintType};
pub use error::{ModelError, ModelResult};
pub use instance::{Instance, Objective};
pub use mapping::{Mapping, NodeState, VmState};
pub use model::Model;
pub use params::Parameters;
pub use plan::{Action, ActionKind, ReconfigurationPlan};
pub use types::{Element, NodeId, VmId};
pub use view::{AttrValue, Attributes, ShareableResource};
