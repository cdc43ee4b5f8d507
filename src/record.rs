//! Simulation records.

use crate::metrics::Counts;
use serde::{Deserialize, Serialize};

/// Snapshot of the aggregate metrics at a given step.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Current simulation step.
    pub step: usize,

    /// Number of vertices per compartment.
    pub counts: Counts,

    /// Fraction of vertices currently recovered.
    pub relative_size: f64,

    /// Expected number of successful attacks.
    pub expected_infections: f64,

    /// Sum of agent utilities.
    pub social_welfare: f64,

    /// Network effect on the probe vertex, if one is configured.
    pub network_effect: Option<f64>,
}

impl Record {
    pub fn n_vertices(&self) -> usize {
        self.counts.susceptible + self.counts.infectious + self.counts.recovered
    }

    pub fn infectious_fraction(&self) -> f64 {
        self.counts.infectious as f64 / self.n_vertices() as f64
    }
}
