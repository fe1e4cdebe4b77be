//! Statistics of an instance solved as independent partitions.
//!
//! Partitions run concurrently: counters add up, build durations are the
//! largest over partitions, and the solving duration is the wall-clock
//! time the orchestrator waited.

use std::fmt;

use serde::{Deserialize, Serialize};

use dcsplit_model::{Instance, Parameters};

use crate::metrics::Metrics;
use crate::solving::{
    SolutionStatistics, SolvingStatistics, write_parameters, write_search, write_sizes,
    write_solutions,
};

/// The report of one partition, tagged with the partition it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStatistics {
    /// Index of the partition in the split output.
    pub partition: usize,
    pub statistics: SolvingStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitioningStatistics {
    pub parameters: Parameters,
    pub nb_nodes: usize,
    pub nb_vms: usize,
    pub nb_constraints: usize,
    /// Epoch milliseconds at which the whole solve started.
    pub start_ms: u64,
    pub split_ms: u64,
    /// Wall-clock time spent waiting for the partitions.
    pub solve_ms: u64,
    pub workers: usize,
    pub nb_partitions: usize,
    /// Per-partition reports, in completion order.
    partitions: Vec<PartitionStatistics>,
}

impl PartitioningStatistics {
    pub fn new(parameters: Parameters, origin: &Instance, start_ms: u64, workers: usize) -> Self {
        Self {
            parameters,
            nb_nodes: origin.model.mapping.nb_nodes(),
            nb_vms: origin.model.mapping.nb_vms(),
            nb_constraints: origin.constraints.len(),
            start_ms,
            split_ms: 0,
            solve_ms: 0,
            workers,
            nb_partitions: 0,
            partitions: Vec::new(),
        }
    }

    pub fn add_partition(&mut self, partition: usize, statistics: SolvingStatistics) {
        self.partitions.push(PartitionStatistics {
            partition,
            statistics,
        });
    }

    pub fn partitions(&self) -> &[PartitionStatistics] {
        &self.partitions
    }

    /// The report of partition `partition`, once it completed.
    pub fn partition(&self, partition: usize) -> Option<&SolvingStatistics> {
        self.partitions
            .iter()
            .find(|p| p.partition == partition)
            .map(|p| &p.statistics)
    }

    /// Indexes of the reported partitions that found no solution, sorted.
    pub fn unsolved_partitions(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .partitions
            .iter()
            .filter(|p| p.statistics.solutions.is_empty())
            .map(|p| p.partition)
            .collect();
        out.sort_unstable();
        out
    }

    /// Indexes of the reported partitions whose search did not complete, sorted.
    pub fn incomplete_partitions(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .partitions
            .iter()
            .filter(|p| !p.statistics.completed)
            .map(|p| p.partition)
            .collect();
        out.sort_unstable();
        out
    }

    fn reports(&self) -> impl Iterator<Item = &SolvingStatistics> + '_ {
        self.partitions.iter().map(|p| &p.statistics)
    }

    pub fn managed_vms(&self) -> usize {
        self.reports().map(|p| p.managed_vms).sum()
    }

    pub fn core_build_ms(&self) -> u64 {
        self.reports().map(|p| p.core_build_ms).max().unwrap_or(0)
    }

    pub fn specialization_ms(&self) -> u64 {
        self.reports()
            .map(|p| p.specialization_ms)
            .max()
            .unwrap_or(0)
    }

    pub fn metrics(&self) -> Metrics {
        self.reports().map(|p| &p.metrics).sum()
    }

    pub fn completed(&self) -> bool {
        self.reports().all(|p| p.completed)
    }

    /// Partitions that reported at least one solution.
    pub fn solved_partitions(&self) -> usize {
        self.reports().filter(|p| !p.solutions.is_empty()).count()
    }

    /// Global solutions, synthesized from the partitions.
    ///
    /// Empty as soon as one partition has no solution. Otherwise the first
    /// global solution combines every partition's first solution and is
    /// reached when the slowest of them is. When some partition improved
    /// on its first solution, a last global solution is built the same way
    /// from every partition's last solution.
    pub fn solutions(&self) -> Vec<SolutionStatistics> {
        if self.partitions.is_empty() || self.solved_partitions() < self.partitions.len() {
            return Vec::new();
        }
        let firsts: Vec<(u64, &SolutionStatistics)> = self
            .reports()
            .filter_map(|p| p.first_solution().map(|s| (p.start_ms, s)))
            .collect();
        let lasts: Vec<(u64, &SolutionStatistics)> = self
            .reports()
            .filter_map(|p| p.last_solution().map(|s| (p.start_ms, s)))
            .collect();

        let mut out = vec![self.combine(&firsts)];
        if self.reports().any(|p| p.solutions.len() > 1) {
            out.push(self.combine(&lasts));
        }
        out
    }

    fn combine(&self, parts: &[(u64, &SolutionStatistics)]) -> SolutionStatistics {
        let end = parts
            .iter()
            .map(|(start, s)| start + s.time_ms())
            .fold(self.start_ms, u64::max);
        let mut metrics: Metrics = parts.iter().map(|(_, s)| &s.metrics).sum();
        metrics.solving_time_ms = end - self.start_ms;

        let objective = parts
            .iter()
            .map(|(_, s)| s.objective)
            .sum::<Option<i64>>();
        SolutionStatistics { metrics, objective }
    }

    /// `managed;split_ms;solve_ms;solutions;completed`
    pub fn to_csv(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.managed_vms(),
            self.split_ms,
            self.solve_ms,
            self.solutions().len(),
            u8::from(self.completed())
        )
    }
}

impl fmt::Display for PartitioningStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solutions = self.solutions();

        write_sizes(f, self.nb_nodes, self.nb_vms, self.managed_vms())?;
        write!(
            f,
            "; {} worker(s), {} partition(s); {} constraint(s)",
            self.workers, self.nb_partitions, self.nb_constraints
        )?;
        write_parameters(f, &self.parameters)?;
        write!(
            f,
            "\nmax. building duration: {}ms (core) + {}ms (specialization)",
            self.core_build_ms(),
            self.specialization_ms()
        )?;
        let waited = Metrics {
            solving_time_ms: self.solve_ms,
            ..self.metrics()
        };
        write_search(f, &waited, self.completed(), solutions.len())?;

        if solutions.is_empty() {
            return write!(
                f,
                ": {}/{} solved partition(s)",
                self.solved_partitions(),
                self.nb_partitions
            );
        }
        let counts: Vec<String> = self
            .reports()
            .map(|p| p.solutions.len().to_string())
            .collect();
        writeln!(f, " [{}]:", counts.join(", "))?;
        write_solutions(f, &solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcsplit_model::{Model, NodeId, Objective, VmId};

    fn origin() -> Instance {
        let mut mo = Model::new();
        for n in 0..4 {
            mo.mapping.add_online_node(NodeId(n));
            mo.mapping.add_running_vm(VmId(n), NodeId(n));
        }
        Instance::empty(mo, Objective::MinMttr)
    }

    fn part(start: u64, managed: usize, core: u64, times: &[u64]) -> SolvingStatistics {
        let mut st = SolvingStatistics::for_instance(Parameters::default(), &Instance::default(), start);
        st.managed_vms = managed;
        st.core_build_ms = core;
        st.metrics = Metrics::new(1, 50, 10, 1, 0, 0);
        for (i, t) in times.iter().enumerate() {
            st.add_solution(
                SolutionStatistics::new(Metrics::new(0, *t, 5, 1, 0, 0)).with_objective(i as i64 + 1),
            );
        }
        st.completed = true;
        st
    }

    fn stats() -> PartitioningStatistics {
        let mut ps = PartitioningStatistics::new(Parameters::default(), &origin(), 1000, 2);
        ps.split_ms = 4;
        ps.solve_ms = 60;
        ps.nb_partitions = 2;
        ps
    }

    #[test]
    fn counters_sum_durations_max() {
        let mut ps = stats();
        ps.add_partition(0, part(1005, 2, 7, &[10]));
        ps.add_partition(1, part(1006, 3, 9, &[20]));

        assert_eq!(ps.managed_vms(), 5);
        assert_eq!(ps.core_build_ms(), 9);
        assert_eq!(ps.metrics().nodes, 20);
        assert_eq!(ps.metrics().solving_time_ms, 100);
        assert!(ps.completed());
    }

    #[test]
    fn first_solution_waits_for_the_slowest_partition() {
        let mut ps = stats();
        ps.add_partition(0, part(1005, 2, 0, &[10]));
        ps.add_partition(1, part(1006, 2, 0, &[20]));

        let sols = ps.solutions();
        assert_eq!(sols.len(), 1);
        // max(1005 + 10, 1006 + 20) - 1000
        assert_eq!(sols[0].time_ms(), 26);
        assert_eq!(sols[0].metrics.nodes, 10);
        assert_eq!(sols[0].objective, Some(2));
    }

    #[test]
    fn last_solution_when_a_partition_improved() {
        let mut ps = stats();
        ps.add_partition(0, part(1000, 1, 0, &[5, 30]));
        ps.add_partition(1, part(1000, 1, 0, &[8]));

        let sols = ps.solutions();
        assert_eq!(sols.len(), 2);
        assert_eq!(sols[0].time_ms(), 8);
        assert_eq!(sols[1].time_ms(), 30);
        assert_eq!(sols[1].objective, Some(3));
    }

    #[test]
    fn one_unsolved_partition_means_no_global_solution() {
        let mut ps = stats();
        ps.add_partition(0, part(1000, 1, 0, &[5]));
        ps.add_partition(1, part(1000, 1, 0, &[]));

        assert!(ps.solutions().is_empty());
        assert_eq!(ps.solved_partitions(), 1);
        assert_eq!(ps.unsolved_partitions(), vec![1]);
        assert!(ps.to_string().ends_with(": 1/2 solved partition(s)"));
    }

    #[test]
    fn reports_keep_their_partition_index() {
        let mut ps = stats();
        // Completion order differs from partition order.
        let mut slow = part(1000, 3, 0, &[]);
        slow.completed = false;
        ps.add_partition(1, part(1000, 2, 0, &[5]));
        ps.add_partition(0, slow);

        let order: Vec<usize> = ps.partitions().iter().map(|p| p.partition).collect();
        assert_eq!(order, vec![1, 0]);
        assert_eq!(ps.partition(0).map(|p| p.managed_vms), Some(3));
        assert_eq!(ps.partition(1).map(|p| p.solutions.len()), Some(1));
        assert!(ps.partition(2).is_none());
        assert_eq!(ps.unsolved_partitions(), vec![0]);
        assert_eq!(ps.incomplete_partitions(), vec![0]);
    }

    #[test]
    fn csv_reporting_line() {
        let mut ps = stats();
        ps.add_partition(0, part(1000, 2, 0, &[5]));
        let mut slow = part(1000, 3, 0, &[6]);
        slow.completed = false;
        ps.add_partition(1, slow);

        assert_eq!(ps.to_csv(), "5;4;60;1;0");
    }

    #[test]
    fn display_lists_per_partition_counts() {
        let mut ps = stats();
        ps.add_partition(0, part(1000, 2, 0, &[5, 9]));
        ps.add_partition(1, part(1000, 2, 0, &[3]));

        let out = ps.to_string();
        assert!(out.starts_with("4 node(s); 4 VM(s); 2 worker(s), 2 partition(s); 0 constraint(s)"));
        assert!(out.contains("After 60ms of search (terminated)"));
        assert!(out.contains(" [2, 1]:\n"));
    }
}
