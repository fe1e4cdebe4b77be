//! `dcsplit scaffold`: write the default scheduler configuration.

use std::path::Path;

use anyhow::{Context, Result};

use dcsplit_scheduler::SchedulerConfig;

pub fn scaffold(output: Option<&Path>) -> Result<()> {
    let content = SchedulerConfig::scaffold().to_toml_string()?;
    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Generated {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dcsplit.toml");
        scaffold(Some(&path)).unwrap();

        let config = SchedulerConfig::from_file(&path).unwrap();
        assert_eq!(config, SchedulerConfig::scaffold());
    }
}
