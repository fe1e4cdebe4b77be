//! Run parameters shared by the partitioner and the solvers.

use serde::{Deserialize, Serialize};

/// Knobs of a solving run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Per-solve time budget in seconds; `0` means unbounded.
    pub time_limit_secs: u64,
    /// Keep searching for better solutions after the first one.
    pub optimize: bool,
    /// Seed for every random choice made during the run.
    pub random_seed: u64,
    pub verbosity: u8,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            time_limit_secs: 0,
            optimize: false,
            random_seed: 0,
            verbosity: 0,
        }
    }
}

impl Parameters {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_time_limit(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn has_time_limit(&self) -> bool {
        self.time_limit_secs > 0
    }
}
