//! Transmission and infection policy.
//!
//! Simple contagion is resisted only by the target's own security. Complex
//! contagion compares the target's infectious neighborhood against its
//! threshold under the network's [`ThresholdPolicy`]. The two paths share no
//! local state.

use crate::error::{NetworkError, Result};
use crate::graph::Topology;
use crate::network::{Compartment, IsolatedPolicy, Network, ThresholdPolicy};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Mapping from the fraction of infectious neighbors to a rejection threshold,
/// used by [`ThresholdPolicy::Probabilistic`].
pub trait Decision {
    fn threshold(&self, active_fraction: f64) -> f64;
}

impl<F: Fn(f64) -> f64> Decision for F {
    fn threshold(&self, active_fraction: f64) -> f64 {
        self(active_fraction)
    }
}

/// Decreasing logistic rejection threshold.
///
/// Equals one half at `midpoint` and tends to zero as the infectious fraction
/// grows past it, faster for larger `steepness`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Sigmoid {
    pub steepness: f64,
    pub midpoint: f64,
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self {
            steepness: 10.0,
            midpoint: 0.5,
        }
    }
}

impl Decision for Sigmoid {
    fn threshold(&self, active_fraction: f64) -> f64 {
        1.0 / (1.0 + (self.steepness * (active_fraction - self.midpoint)).exp())
    }
}

impl<G: Topology> Network<G> {
    /// Probability of transmission from `u` to `v` across their edge.
    ///
    /// Grows with the edge rate and with the remaining infectious time of `u`.
    pub fn transmissibility(&self, u: usize, v: usize) -> Result<f64> {
        let rate = self.rates[self.edge(u, v)?];
        let infectious_time = self.agents[u].infectious_time as f64;
        Ok(1.0 - (-rate * infectious_time).exp())
    }

    /// Number of infectious neighbors of `v`.
    pub fn active_neighbors(&self, v: usize) -> Result<usize> {
        self.check_vertex(v)?;
        let count = self
            .topology
            .neighbors(v)
            .iter()
            .filter(|&&w| self.agents[w].is_infectious())
            .count();
        Ok(count)
    }

    /// Decide whether `v` would become infectious, without changing the network.
    ///
    /// Vertices that are not susceptible are never infected and consume no
    /// random draws.
    pub fn evaluate_infection<D, R>(
        &self,
        v: usize,
        complex: bool,
        decision: &D,
        rng: &mut R,
    ) -> Result<bool>
    where
        D: Decision + ?Sized,
        R: Rng + ?Sized,
    {
        let agent = self.agent(v)?;
        if !agent.is_susceptible() {
            return Ok(false);
        }
        if !complex {
            return Ok(rng.random::<f64>() >= agent.security);
        }

        let active = self.active_neighbors(v)? as f64;
        let degree = self.topology.degree(v);
        if degree == 0 && self.threshold != ThresholdPolicy::Absolute {
            return match self.isolated {
                IsolatedPolicy::Fail => Ok(false),
                IsolatedPolicy::Error => Err(NetworkError::IsolatedVertex(v)),
            };
        }

        let infected = match self.threshold {
            ThresholdPolicy::Relative => active / degree as f64 >= agent.threshold_value,
            ThresholdPolicy::Absolute => active >= agent.threshold_value,
            ThresholdPolicy::Probabilistic => {
                let rejection = decision.threshold(active / degree as f64);
                rng.random::<f64>() >= rejection
            }
        };
        Ok(infected)
    }

    /// Move `v` into the infectious compartment.
    ///
    /// Returns `false` if `v` was not susceptible.
    pub fn infect(&mut self, v: usize) -> Result<bool> {
        self.check_vertex(v)?;
        let agent = &mut self.agents[v];
        if !agent.is_susceptible() {
            return Ok(false);
        }
        agent.compartment = Compartment::Infectious;
        Ok(true)
    }

    /// Attempt to infect `v` and return whether it transitioned.
    pub fn attempt_infection<D, R>(
        &mut self,
        v: usize,
        complex: bool,
        decision: &D,
        rng: &mut R,
    ) -> Result<bool>
    where
        D: Decision + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.evaluate_infection(v, complex, decision, rng)? {
            return Ok(false);
        }
        self.infect(v)
    }
}
