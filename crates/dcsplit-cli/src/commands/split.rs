//! `dcsplit split`: partition an instance file and describe the result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use dcsplit_model::{Instance, NodeId};
use dcsplit_scheduler::{PartitioningConfig, SchedulerConfig};

/// Command line overrides applied on top of the configuration file.
#[derive(Debug, Default)]
pub struct SplitOptions {
    pub config: Option<PathBuf>,
    pub size: Option<usize>,
    pub random: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PartitionReport {
    pub index: usize,
    pub nodes: Vec<NodeId>,
    pub nb_vms: usize,
    pub ready_vms: usize,
    pub constraints: Vec<String>,
}

pub fn split(instance: &Path, opts: &SplitOptions, format: &str) -> Result<()> {
    let reports = partitions(instance, opts)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        _ => {
            print!("{}", format_reports(&reports));
        }
    }
    Ok(())
}

pub fn resolve_config(opts: &SplitOptions) -> Result<SchedulerConfig> {
    let mut config = match &opts.config {
        Some(path) => SchedulerConfig::from_file(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(size) = opts.size {
        config.partitioning = PartitioningConfig::FixedSize {
            size,
            random: opts.random,
        };
    } else if opts.random {
        match &mut config.partitioning {
            PartitioningConfig::FixedSize { random, .. } => *random = true,
            PartitioningConfig::NodeSets { .. } => {
                anyhow::bail!("--random only applies to fixed-size partitioning")
            }
        }
    }
    if let Some(seed) = opts.seed {
        config.parameters.random_seed = seed;
    }
    Ok(config)
}

pub fn partitions(path: &Path, opts: &SplitOptions) -> Result<Vec<PartitionReport>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let instance = Instance::from_json(&content)
        .with_context(|| format!("invalid instance {}", path.display()))?;

    let dangling = instance.dangling_vms();
    if !dangling.is_empty() {
        warn!(count = dangling.len(), "constraints mention VMs the model does not know");
    }

    let config = resolve_config(opts)?;
    let parts = config
        .partitioner()?
        .split(&config.parameters, &instance)?;
    info!(partitions = parts.len(), "instance split");

    Ok(parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let mapping = &part.model.mapping;
            PartitionReport {
                index,
                nodes: mapping.nodes().collect(),
                nb_vms: mapping.nb_vms(),
                ready_vms: mapping.ready_vms().count(),
                constraints: part.constraints.iter().map(ToString::to_string).collect(),
            }
        })
        .collect())
}

pub fn format_reports(reports: &[PartitionReport]) -> String {
    let mut out = format!("{} partition(s)\n", reports.len());
    for r in reports {
        out.push_str(&format!(
            "\npartition {}: {} node(s), {} VM(s) ({} ready), {} constraint(s)\n",
            r.index,
            r.nodes.len(),
            r.nb_vms,
            r.ready_vms,
            r.constraints.len()
        ));
        for c in &r.constraints {
            out.push_str(&format!("  {c}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use dcsplit_model::{Constraint, ConstraintKind, Model, Objective, VmId};

    fn instance_file() -> tempfile::NamedTempFile {
        let mut mo = Model::new();
        for i in 0..4 {
            mo.mapping.add_online_node(NodeId(i));
            mo.mapping.add_running_vm(VmId(i), NodeId(i));
        }
        let inst = Instance::new(
            mo,
            vec![
                Constraint::new(ConstraintKind::Spread {
                    vms: [VmId(0), VmId(1), VmId(2)].into(),
                }),
                Constraint::new(ConstraintKind::Running { vm: VmId(3) }),
            ],
            Objective::MinMttr,
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(inst.to_json_pretty().unwrap().as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_split_with_size_override() {
        let file = instance_file();
        let opts = SplitOptions {
            size: Some(2),
            ..SplitOptions::default()
        };
        let reports = partitions(file.path(), &opts).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].nodes, vec![NodeId(0), NodeId(1)]);
        assert_eq!(reports[0].constraints, vec!["spread(vms=[vm0, vm1], discrete)"]);
        // A single VM left: the spread is dropped there.
        assert_eq!(reports[1].constraints, vec!["running(vm=vm3, discrete)"]);

        let text = format_reports(&reports);
        assert!(text.starts_with("2 partition(s)\n"));
        assert!(text.contains("partition 1: 2 node(s), 2 VM(s) (0 ready), 1 constraint(s)"));
    }

    #[test]
    fn test_config_file_and_seed() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "[partitioning]\nmode = \"node-sets\"\ngroups = [[0, 1, 2, 3]]").unwrap();

        let opts = SplitOptions {
            config: Some(config.path().to_path_buf()),
            seed: Some(5),
            ..SplitOptions::default()
        };
        let resolved = resolve_config(&opts).unwrap();
        assert_eq!(resolved.parameters.random_seed, 5);

        let reports = partitions(instance_file().path(), &opts).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].constraints.len(), 2);

        let random = SplitOptions {
            random: true,
            ..opts
        };
        assert!(resolve_config(&random).is_err());
    }

    #[test]
    fn test_missing_instance() {
        let err = partitions(Path::new("/nonexistent/instance.json"), &SplitOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
