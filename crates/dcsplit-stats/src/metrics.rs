//! Additive solver measures.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Counters reported by one solve. Every field is additive, so measures
/// from several stages or partitions combine with `+`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metrics {
    /// Time spent building the solver model, in milliseconds.
    pub reading_time_ms: u64,
    /// Time spent searching, in milliseconds.
    pub solving_time_ms: u64,
    /// Opened search nodes.
    pub nodes: u64,
    pub backtracks: u64,
    pub fails: u64,
    pub restarts: u64,
}

impl Metrics {
    pub fn new(
        reading_time_ms: u64,
        solving_time_ms: u64,
        nodes: u64,
        backtracks: u64,
        fails: u64,
        restarts: u64,
    ) -> Self {
        Self {
            reading_time_ms,
            solving_time_ms,
            nodes,
            backtracks,
            fails,
            restarts,
        }
    }

    /// Opened nodes per second of search.
    pub fn nodes_per_sec(&self) -> f64 {
        if self.solving_time_ms == 0 {
            return 0.0;
        }
        self.nodes as f64 * 1000.0 / self.solving_time_ms as f64
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(mut self, rhs: Metrics) -> Metrics {
        self += rhs;
        self
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Metrics) {
        self.reading_time_ms += rhs.reading_time_ms;
        self.solving_time_ms += rhs.solving_time_ms;
        self.nodes += rhs.nodes;
        self.backtracks += rhs.backtracks;
        self.fails += rhs.fails;
        self.restarts += rhs.restarts;
    }
}

impl Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Self {
        iter.fold(Metrics::default(), Add::add)
    }
}

impl<'a> Sum<&'a Metrics> for Metrics {
    fn sum<I: Iterator<Item = &'a Metrics>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}ms, {} nodes ({:.1} n/s), {} backtracks, {} fails, {} restarts",
            self.solving_time_ms,
            self.nodes,
            self.nodes_per_sec(),
            self.backtracks,
            self.fails,
            self.restarts
        )
    }
}
