//! Aggregate metrics over the current network state.

use crate::error::{NetworkError, Result};
use crate::graph::Topology;
use crate::network::{Compartment, Network};
use serde::{Deserialize, Serialize};

/// Number of vertices in each compartment.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Counts {
    pub susceptible: usize,
    pub infectious: usize,
    pub recovered: usize,
}

impl<G: Topology> Network<G> {
    /// Sum of the utilities of all agents.
    pub fn social_welfare(&self) -> f64 {
        self.agents.iter().map(|agent| agent.utility).sum()
    }

    /// Number of recovered vertices.
    pub fn final_size(&self) -> usize {
        self.agents.iter().filter(|agent| agent.is_recovered()).count()
    }

    /// Fraction of vertices that are recovered.
    pub fn relative_size(&self) -> Result<f64> {
        if self.agents.is_empty() {
            return Err(NetworkError::EmptyNetwork);
        }
        Ok(self.final_size() as f64 / self.agents.len() as f64)
    }

    /// Expected number of successful attacks, `sum(attack (1 - security))`.
    pub fn expected_infections(&self) -> f64 {
        self.agents
            .iter()
            .map(|agent| agent.attack_decision * (1.0 - agent.security))
            .sum()
    }

    pub fn compartment_counts(&self) -> Counts {
        let mut counts = Counts::default();
        for agent in &self.agents {
            match agent.compartment {
                Compartment::Susceptible => counts.susceptible += 1,
                Compartment::Infectious => counts.infectious += 1,
                Compartment::Recovered => counts.recovered += 1,
            }
        }
        counts
    }
}
