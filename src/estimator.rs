//! Network-effect estimator.
//!
//! Estimates how much of the network's attack mass reaches a vertex. The
//! estimate peels vertices off one at a time: a random vertex `j` is chosen,
//! the attack mass that reaches the target through `j` is added, and `j` is
//! hidden from the rest of the computation. Hiding lives in an [`Estimator`]
//! of its own, so the network is only borrowed immutably and no visibility
//! state outlives a call.

use crate::error::{NetworkError, Result};
use crate::graph::Topology;
use crate::network::Network;
use rand::prelude::*;
use std::ops::{Deref, DerefMut};

/// Hidden-vertex layer for one estimate.
pub struct Estimator<'a, G> {
    network: &'a Network<G>,
    hidden: Vec<bool>,
}

/// Hides one vertex for as long as it is alive.
struct Exclusion<'s, 'a, G> {
    estimator: &'s mut Estimator<'a, G>,
    vertex: usize,
}

impl<'a, G> Deref for Exclusion<'_, 'a, G> {
    type Target = Estimator<'a, G>;

    fn deref(&self) -> &Self::Target {
        self.estimator
    }
}

impl<G> DerefMut for Exclusion<'_, '_, G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.estimator
    }
}

impl<G> Drop for Exclusion<'_, '_, G> {
    fn drop(&mut self) {
        self.estimator.hidden[self.vertex] = false;
    }
}

impl<'a, G: Topology> Estimator<'a, G> {
    pub fn new(network: &'a Network<G>) -> Self {
        Self {
            network,
            hidden: vec![false; network.n_vertices()],
        }
    }

    /// Whether no vertex is currently hidden.
    pub fn is_clear(&self) -> bool {
        !self.hidden.contains(&true)
    }

    fn exclude(&mut self, vertex: usize) -> Exclusion<'_, 'a, G> {
        self.hidden[vertex] = true;
        Exclusion {
            estimator: self,
            vertex,
        }
    }

    /// Attack mass reaching `i` along simple paths through `j`, scaled by the
    /// vulnerability of `j`.
    ///
    /// Each visible source `v` contributes `attack(v) (1 - security(v))` times
    /// `1 - security(k)` for every intermediate vertex `k` of every simple path
    /// from `v` to `i` that contains `j`.
    pub fn externality(&self, i: usize, j: usize) -> Result<f64> {
        self.network.check_vertex(i)?;
        self.network.check_vertex(j)?;

        let agents = self.network.agents();
        let visible: Vec<bool> = self.hidden.iter().map(|&hidden| !hidden).collect();
        let mut attack_mass = 0.0;
        for (v, source) in agents.iter().enumerate() {
            if v == i || !visible[v] {
                continue;
            }
            let weight = source.attack_decision() * (1.0 - source.security());
            self.network
                .topology()
                .for_each_simple_path(v, i, &visible, &mut |path| {
                    if !path.contains(&j) {
                        return;
                    }
                    let transmission: f64 = path[1..path.len() - 1]
                        .iter()
                        .map(|&k| 1.0 - agents[k].security())
                        .product();
                    attack_mass += weight * transmission;
                });
        }

        Ok((1.0 - agents[j].security()) * attack_mass)
    }

    /// Total indirect infection probability of `i` from every visible vertex.
    pub fn infection_probability<R: Rng + ?Sized>(&mut self, i: usize, rng: &mut R) -> Result<f64> {
        self.network.check_vertex(i)?;

        let visible: Vec<usize> = (0..self.hidden.len())
            .filter(|&v| !self.hidden[v])
            .collect();
        if visible.len() == 1 {
            return Ok(self.network.agents()[visible[0]].attack_decision());
        }

        let candidates: Vec<usize> = visible.into_iter().filter(|&v| v != i).collect();
        let &j = candidates
            .choose(rng)
            .ok_or_else(|| NetworkError::Invariant(format!("vertex {i} is hidden")))?;
        let externality = self.externality(i, j)?;

        let mut scope = self.exclude(j);
        let rest = scope.infection_probability(i, rng)?;
        Ok(rest + externality)
    }
}

impl<G: Topology> Network<G> {
    /// Externality of `j` on `i` over the whole network.
    pub fn compute_externality(&self, i: usize, j: usize) -> Result<f64> {
        Estimator::new(self).externality(i, j)
    }

    /// Probability that the network's attack mass reaches `i`.
    ///
    /// A single-vertex network returns that vertex's attack decision.
    pub fn compute_infection_probability<R: Rng + ?Sized>(
        &self,
        i: usize,
        rng: &mut R,
    ) -> Result<f64> {
        let mut estimator = Estimator::new(self);
        let probability = estimator.infection_probability(i, rng);
        debug_assert!(estimator.is_clear());
        probability
    }

    /// Probability of infection induced on `i` by the whole network, scaled by
    /// the vulnerability of `i`.
    pub fn compute_network_effect<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> Result<f64> {
        let probability = self.compute_infection_probability(i, rng)?;
        Ok((1.0 - self.agents[i].security) * probability)
    }
}
