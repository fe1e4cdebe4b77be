//! dcsplit.toml configuration parser.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dcsplit_model::{NodeId, Parameters};
use dcsplit_partition::{
    FixedSizePartitioning, GroupedSubsetsPolicy, NodeSetsPartitioning, Partitioner,
    SplitterRegistry,
};

use crate::error::{SchedulerError, SchedulerResult};
use crate::partitioning::StaticPartitioning;
use crate::solver::InstanceSolver;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Partitions solved at the same time. Defaults to the number of
    /// processing units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub grouped_subsets: GroupedSubsetsPolicy,
    pub partitioning: PartitioningConfig,
    pub parameters: Parameters,
}

/// How nodes are grouped into partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PartitioningConfig {
    NodeSets {
        groups: Vec<BTreeSet<NodeId>>,
    },
    FixedSize {
        size: usize,
        #[serde(default)]
        random: bool,
    },
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            grouped_subsets: GroupedSubsetsPolicy::default(),
            partitioning: PartitioningConfig::FixedSize {
                size: 64,
                random: false,
            },
            parameters: Parameters::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_file(path: &Path) -> SchedulerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> SchedulerResult<Self> {
        toml::from_str(s).map_err(|e| SchedulerError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> SchedulerResult<String> {
        toml::to_string_pretty(self).map_err(|e| SchedulerError::Config(e.to_string()))
    }

    /// Starting point written by `dcsplit scaffold`: linear groups of 64
    /// nodes and a 5 minute budget per partition.
    pub fn scaffold() -> Self {
        Self {
            workers: Some(crate::partitioning::default_workers()),
            parameters: Parameters::default().with_time_limit(300),
            ..Self::default()
        }
    }

    pub fn registry(&self) -> SplitterRegistry {
        SplitterRegistry::standard(self.grouped_subsets)
    }

    pub fn partitioner(&self) -> SchedulerResult<Arc<dyn Partitioner>> {
        let registry = self.registry();
        let partitioner: Arc<dyn Partitioner> = match &self.partitioning {
            PartitioningConfig::NodeSets { groups } => {
                Arc::new(NodeSetsPartitioning::new(groups.clone()).with_registry(registry))
            }
            PartitioningConfig::FixedSize { size, random } => Arc::new(
                FixedSizePartitioning::new(*size)?
                    .random(*random)
                    .with_registry(registry),
            ),
        };
        Ok(partitioner)
    }

    /// Assemble an orchestrator around `solver`.
    pub fn build(&self, solver: Arc<dyn InstanceSolver>) -> SchedulerResult<StaticPartitioning> {
        let sp = StaticPartitioning::new(self.partitioner()?, solver);
        match self.workers {
            Some(w) => sp.with_workers(w),
            None => Ok(sp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scaffold() {
        let config = SchedulerConfig::scaffold();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("fixed-size"));
        assert!(toml_str.contains("best-effort"));

        let back = SchedulerConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parse_minimal() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn test_parse_node_sets() {
        let toml_str = r#"
workers = 3
grouped_subsets = "reject"

[partitioning]
mode = "node-sets"
groups = [[0, 1], [2]]

[parameters]
random_seed = 17
optimize = true
"#;
        let config = SchedulerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.grouped_subsets, GroupedSubsetsPolicy::Reject);
        assert_eq!(
            config.partitioning,
            PartitioningConfig::NodeSets {
                groups: vec![[NodeId(0), NodeId(1)].into(), [NodeId(2)].into()],
            }
        );
        assert_eq!(config.parameters.random_seed, 17);
        assert!(config.parameters.optimize);
        assert_eq!(config.parameters.time_limit_secs, 0);
    }

    #[test]
    fn test_parse_fixed_size() {
        let toml_str = r#"
[partitioning]
mode = "fixed-size"
size = 5
random = true
"#;
        let config = SchedulerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(
            config.partitioning,
            PartitioningConfig::FixedSize { size: 5, random: true }
        );
    }

    #[test]
    fn test_unknown_mode_is_a_config_error() {
        let err = SchedulerConfig::from_toml_str("[partitioning]\nmode = \"spiral\"\n").unwrap_err();
        assert!(matches!(err, SchedulerError::Config(_)));
    }

    #[test]
    fn test_zero_size_is_refused_at_build() {
        let config = SchedulerConfig {
            partitioning: PartitioningConfig::FixedSize { size: 0, random: false },
            ..SchedulerConfig::default()
        };
        assert!(matches!(config.partitioner(), Err(SchedulerError::Split(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers = 2\n[partitioning]\nmode = \"fixed-size\"\nsize = 8").unwrap();

        let config = SchedulerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.workers, Some(2));

        let missing = SchedulerConfig::from_file(Path::new("/nonexistent/dcsplit.toml"));
        assert!(matches!(missing, Err(SchedulerError::Config(_))));
    }
}
