//! Statistics of an instance solved over sequential stages.
//!
//! Counters add up across stages. Start time and parameters come from the
//! first stage; solutions and the completion flag from the last one.

use std::fmt;

use serde::Serialize;

use dcsplit_model::Parameters;

use crate::metrics::Metrics;
use crate::solving::{SolutionStatistics, SolvingStatistics};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedStatistics {
    // Never empty.
    stages: Vec<SolvingStatistics>,
}

impl StagedStatistics {
    pub fn new(first: SolvingStatistics) -> Self {
        Self {
            stages: vec![first],
        }
    }

    pub fn append(&mut self, stage: SolvingStatistics) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn nb_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, i: usize) -> Option<&SolvingStatistics> {
        self.stages.get(i)
    }

    fn first(&self) -> &SolvingStatistics {
        &self.stages[0]
    }

    fn last(&self) -> &SolvingStatistics {
        &self.stages[self.stages.len() - 1]
    }

    pub fn start_ms(&self) -> u64 {
        self.first().start_ms
    }

    pub fn parameters(&self) -> &Parameters {
        &self.first().parameters
    }

    pub fn core_build_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.core_build_ms).sum()
    }

    pub fn specialization_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.specialization_ms).sum()
    }

    pub fn metrics(&self) -> Metrics {
        self.stages.iter().map(|s| &s.metrics).sum()
    }

    pub fn solutions(&self) -> &[SolutionStatistics] {
        &self.last().solutions
    }

    pub fn managed_vms(&self) -> usize {
        self.last().managed_vms
    }

    pub fn completed(&self) -> bool {
        self.last().completed
    }

    /// Collapse the stages into the statistics of one solve.
    pub fn flatten(&self) -> SolvingStatistics {
        let first = self.first();
        let last = self.last();
        SolvingStatistics {
            parameters: first.parameters.clone(),
            nb_nodes: first.nb_nodes,
            nb_vms: first.nb_vms,
            nb_constraints: first.nb_constraints,
            managed_vms: last.managed_vms,
            start_ms: first.start_ms,
            core_build_ms: self.core_build_ms(),
            specialization_ms: self.specialization_ms(),
            metrics: self.metrics(),
            solutions: last.solutions.clone(),
            completed: last.completed,
        }
    }

    /// `managed;core_ms;specialization_ms;solving_ms;solutions;completed`
    ///
    /// `managed` is the largest stage, solutions drop to 0 as soon as one
    /// stage found none, and completed requires every stage to complete.
    pub fn to_csv(&self) -> String {
        let managed = self.stages.iter().map(|s| s.managed_vms).max().unwrap_or(0);
        let solutions = if self.stages.iter().any(|s| s.solutions.is_empty()) {
            0
        } else {
            self.last().solutions.len()
        };
        let completed = self.stages.iter().all(|s| s.completed);
        format!(
            "{};{};{};{};{};{}",
            managed,
            self.core_build_ms(),
            self.specialization_ms(),
            self.metrics().solving_time_ms,
            solutions,
            u8::from(completed)
        )
    }
}

impl fmt::Display for StagedStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.stages.len();
        for (i, st) in self.stages.iter().enumerate() {
            writeln!(f, "---- Stage {}/{} ----", i + 1, n)?;
            writeln!(f, "{st}")?;
        }
        Ok(())
    }
}
