//! The unit of work handed to a solver.

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::error::{ModelError, ModelResult};
use crate::model::Model;

/// Optimization objective of an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Minimize the mean time to repair (sum of action end times).
    #[default]
    MinMttr,
    /// Any viable plan will do.
    Feasibility,
}

/// A model, the constraints to satisfy on it, and an objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub model: Model,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub objective: Objective,
}

impl Instance {
    pub fn new(model: Model, constraints: Vec<Constraint>, objective: Objective) -> Self {
        Self {
            model,
            constraints,
            objective,
        }
    }

    /// An instance with no constraint yet.
    pub fn empty(model: Model, objective: Objective) -> Self {
        Self::new(model, Vec::new(), objective)
    }

    pub fn from_json(s: &str) -> ModelResult<Self> {
        serde_json::from_str(s).map_err(|e| ModelError::Deserialize(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialize(e.to_string()))
    }

    /// Identifiers of every VM that some constraint mentions but the
    /// model does not know.
    pub fn dangling_vms(&self) -> Vec<crate::types::VmId> {
        let mut out: Vec<_> = self
            .constraints
            .iter()
            .flat_map(|c| c.kind.involved_vms())
            .filter(|v| !self.model.contains_vm(*v))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
