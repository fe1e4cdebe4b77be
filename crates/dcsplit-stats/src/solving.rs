//! Statistics of a single solve.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use dcsplit_model::{Instance, Parameters};

use crate::metrics::Metrics;

/// Measures taken at the moment a solution was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionStatistics {
    pub metrics: Metrics,
    /// Objective value, when the solve optimized one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<i64>,
}

impl SolutionStatistics {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            objective: None,
        }
    }

    pub fn with_objective(mut self, value: i64) -> Self {
        self.objective = Some(value);
        self
    }

    /// Milliseconds since the solve started.
    pub fn time_ms(&self) -> u64 {
        self.metrics.solving_time_ms
    }
}

/// Report produced by a solver for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvingStatistics {
    pub parameters: Parameters,
    pub nb_nodes: usize,
    pub nb_vms: usize,
    pub nb_constraints: usize,
    /// VMs the solver was allowed to act on.
    pub managed_vms: usize,
    /// Epoch milliseconds at which the solve started.
    pub start_ms: u64,
    pub core_build_ms: u64,
    pub specialization_ms: u64,
    pub metrics: Metrics,
    /// Solutions in discovery order.
    #[serde(default)]
    pub solutions: Vec<SolutionStatistics>,
    /// `false` when the search stopped before proving its result.
    pub completed: bool,
}

impl SolvingStatistics {
    /// Empty statistics sized after `instance`. Every VM is managed.
    pub fn for_instance(parameters: Parameters, instance: &Instance, start_ms: u64) -> Self {
        let nb_vms = instance.model.mapping.nb_vms();
        Self {
            parameters,
            nb_nodes: instance.model.mapping.nb_nodes(),
            nb_vms,
            nb_constraints: instance.constraints.len(),
            managed_vms: nb_vms,
            start_ms,
            core_build_ms: 0,
            specialization_ms: 0,
            metrics: Metrics::default(),
            solutions: Vec::new(),
            completed: false,
        }
    }

    pub fn add_solution(&mut self, s: SolutionStatistics) {
        self.solutions.push(s);
    }

    pub fn first_solution(&self) -> Option<&SolutionStatistics> {
        self.solutions.first()
    }

    pub fn last_solution(&self) -> Option<&SolutionStatistics> {
        self.solutions.last()
    }

    pub fn hit_timeout(&self) -> bool {
        !self.completed
    }

    /// `managed;core_ms;specialization_ms;solving_ms;solutions;completed`
    pub fn to_csv(&self) -> String {
        format!(
            "{};{};{};{};{};{}",
            self.managed_vms,
            self.core_build_ms,
            self.specialization_ms,
            self.metrics.solving_time_ms,
            self.solutions.len(),
            u8::from(self.completed)
        )
    }
}

impl fmt::Display for SolvingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sizes(f, self.nb_nodes, self.nb_vms, self.managed_vms)?;
        write!(f, "; {} constraint(s)", self.nb_constraints)?;
        write_parameters(f, &self.parameters)?;
        write!(
            f,
            "\nBuilding duration: {}ms (core) + {}ms (specialization)",
            self.core_build_ms, self.specialization_ms
        )?;
        write_search(f, &self.metrics, self.completed, self.solutions.len())?;
        if self.solutions.is_empty() {
            write!(f, ".")
        } else {
            writeln!(f, ":")?;
            write_solutions(f, &self.solutions)
        }
    }
}

/// Current time in epoch milliseconds.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub(crate) fn write_sizes(
    f: &mut fmt::Formatter<'_>,
    nodes: usize,
    vms: usize,
    managed: usize,
) -> fmt::Result {
    write!(f, "{nodes} node(s); {vms} VM(s)")?;
    if managed != vms {
        write!(f, " ({managed} managed)")?;
    }
    Ok(())
}

pub(crate) fn write_parameters(f: &mut fmt::Formatter<'_>, ps: &Parameters) -> fmt::Result {
    if ps.optimize {
        write!(f, "; optimize")?;
    }
    if ps.has_time_limit() {
        write!(f, "; timeout: {}s", ps.time_limit_secs)?;
    }
    Ok(())
}

pub(crate) fn write_search(
    f: &mut fmt::Formatter<'_>,
    m: &Metrics,
    completed: bool,
    nb_solutions: usize,
) -> fmt::Result {
    write!(
        f,
        "\nAfter {}ms of search ({}): {} opened search node(s), {} backtrack(s), {} solution(s)",
        m.solving_time_ms,
        if completed { "terminated" } else { "timeout" },
        m.nodes,
        m.backtracks,
        nb_solutions
    )
}

pub(crate) fn write_solutions(
    f: &mut fmt::Formatter<'_>,
    solutions: &[SolutionStatistics],
) -> fmt::Result {
    for (i, s) in solutions.iter().enumerate() {
        write!(
            f,
            "\t{}) at {}ms: {} node(s), {} backtrack(s)",
            i + 1,
            s.time_ms(),
            s.metrics.nodes,
            s.metrics.backtracks
        )?;
        if let Some(o) = s.objective {
            write!(f, ", objective: {o}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcsplit_model::{Model, NodeId, Objective, VmId};

    fn instance() -> Instance {
        let mut mo = Model::new();
        mo.mapping.add_online_node(NodeId(0));
        mo.mapping.add_running_vm(VmId(0), NodeId(0));
        mo.mapping.add_ready_vm(VmId(1));
        Instance::empty(mo, Objective::MinMttr)
    }

    #[test]
    fn sized_after_instance() {
        let st = SolvingStatistics::for_instance(Parameters::default(), &instance(), 42);
        assert_eq!(st.nb_nodes, 1);
        assert_eq!(st.nb_vms, 2);
        assert_eq!(st.managed_vms, 2);
        assert_eq!(st.start_ms, 42);
        assert!(st.solutions.is_empty());
    }

    #[test]
    fn csv_line() {
        let mut st = SolvingStatistics::for_instance(Parameters::default(), &instance(), 0);
        st.core_build_ms = 12;
        st.specialization_ms = 3;
        st.metrics.solving_time_ms = 40;
        st.completed = true;
        st.add_solution(SolutionStatistics::new(Metrics::new(0, 25, 10, 0, 0, 0)));
        assert_eq!(st.to_csv(), "2;12;3;40;1;1");
    }

    #[test]
    fn display_lists_solutions() {
        let mut st = SolvingStatistics::for_instance(Parameters::default(), &instance(), 0);
        st.managed_vms = 1;
        st.completed = true;
        st.add_solution(SolutionStatistics::new(Metrics::new(0, 5, 3, 1, 0, 0)).with_objective(7));

        let out = st.to_string();
        assert!(out.starts_with("1 node(s); 2 VM(s) (1 managed); 0 constraint(s)"));
        assert!(out.contains("(terminated)"));
        assert!(out.contains("\t1) at 5ms: 3 node(s), 1 backtrack(s), objective: 7\n"));
    }

    #[test]
    fn display_without_solution_ends_with_period() {
        let st = SolvingStatistics::for_instance(Parameters::default(), &instance(), 0);
        let out = st.to_string();
        assert!(out.ends_with("0 solution(s)."));
        assert!(out.contains("(timeout)"));
    }
}
