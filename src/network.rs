//! Network model: global parameters and per-vertex / per-edge attributes.

use crate::error::{NetworkError, Result};
use crate::graph::{AdjacencyList, Topology};
use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Render state of a susceptible vertex (white).
pub const COLOR_S: [f64; 4] = [1.0, 1.0, 1.0, 1.0];
/// Render state of an infectious vertex (black).
pub const COLOR_I: [f64; 4] = [0.0, 0.0, 0.0, 1.0];
/// Render state of a recovered vertex (grey).
pub const COLOR_R: [f64; 4] = [0.5, 0.5, 0.5, 1.0];

/// Compartmental model family.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Recovery grants permanent immunity.
    Sir,
    /// Immunity wanes and recovered vertices become susceptible again.
    #[default]
    Sirs,
}

impl Model {
    pub fn has_waning_immunity(self) -> bool {
        matches!(self, Self::Sirs)
    }
}

/// Rule used by complex contagion to compare active neighbors against a vertex threshold.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// Fraction of infectious neighbors must reach the threshold.
    #[default]
    Relative,
    /// Number of infectious neighbors must reach the threshold.
    Absolute,
    /// Random draw must reach a decision function of the infectious fraction.
    Probabilistic,
}

impl FromStr for ThresholdPolicy {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            "probabilistic" => Ok(Self::Probabilistic),
            _ => Err(NetworkError::UnknownThresholdPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Probabilistic => "probabilistic",
        };
        f.write_str(name)
    }
}

/// Outcome of a degree-normalized threshold check on a vertex without neighbors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolatedPolicy {
    /// The infection attempt fails.
    #[default]
    Fail,
    /// The attempt returns [`NetworkError::IsolatedVertex`].
    Error,
}

/// Epidemiological compartment of a vertex.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Infectious,
    Recovered,
}

impl Compartment {
    pub fn color(self) -> [f64; 4] {
        match self {
            Self::Susceptible => COLOR_S,
            Self::Infectious => COLOR_I,
            Self::Recovered => COLOR_R,
        }
    }
}

/// Half-open range `[start, stop)` from which default countdowns are drawn.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u32,
    pub stop: u32,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self { start: 1, stop: 10 }
    }
}

impl TimeRange {
    pub fn validate(&self) -> Result<()> {
        if self.start < 1 || self.start >= self.stop {
            return Err(NetworkError::InvalidTimeRange {
                start: self.start,
                stop: self.stop,
            });
        }
        Ok(())
    }
}

/// Agent attached to a vertex.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub(crate) infectious_time: u32,
    pub(crate) initial_infectious_time: u32,
    pub(crate) recovered_time: u32,
    pub(crate) initial_recovered_time: u32,
    pub(crate) security: f64,
    pub(crate) utility: f64,
    pub(crate) threshold_value: f64,
    pub(crate) attack_decision: f64,
    pub(crate) compartment: Compartment,
    pub(crate) layer: Option<i32>,
}

impl Agent {
    fn neutral(attack_decision: f64, threshold_value: f64) -> Self {
        Self {
            infectious_time: 1,
            initial_infectious_time: 1,
            recovered_time: 1,
            initial_recovered_time: 1,
            security: 0.0,
            utility: 0.0,
            threshold_value,
            attack_decision,
            compartment: Compartment::Susceptible,
            layer: None,
        }
    }

    pub fn infectious_time(&self) -> u32 {
        self.infectious_time
    }

    pub fn initial_infectious_time(&self) -> u32 {
        self.initial_infectious_time
    }

    pub fn recovered_time(&self) -> u32 {
        self.recovered_time
    }

    pub fn initial_recovered_time(&self) -> u32 {
        self.initial_recovered_time
    }

    pub fn security(&self) -> f64 {
        self.security
    }

    pub fn utility(&self) -> f64 {
        self.utility
    }

    pub fn threshold_value(&self) -> f64 {
        self.threshold_value
    }

    pub fn attack_decision(&self) -> f64 {
        self.attack_decision
    }

    pub fn compartment(&self) -> Compartment {
        self.compartment
    }

    pub fn layer(&self) -> Option<i32> {
        self.layer
    }

    pub fn is_susceptible(&self) -> bool {
        self.compartment == Compartment::Susceptible
    }

    pub fn is_infectious(&self) -> bool {
        self.compartment == Compartment::Infectious
    }

    pub fn is_recovered(&self) -> bool {
        self.compartment == Compartment::Recovered
    }
}

/// Simulation universe.
///
/// Owns the topology, one [`Agent`] per vertex and one transmission rate per
/// edge. All attribute storage is private; mutation goes through the
/// validated setters, the infection policy and the epidemic clock.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Network<G = AdjacencyList> {
    pub(crate) model: Model,
    pub(crate) threshold: ThresholdPolicy,
    pub(crate) isolated: IsolatedPolicy,
    pub(crate) topology: G,
    pub(crate) agents: Vec<Agent>,
    pub(crate) rates: Vec<f64>,
}

impl Network<AdjacencyList> {
    /// Create a network from a vertex count and an edge list, with neutral attributes.
    pub fn new(
        n_vertices: usize,
        edges: &[(usize, usize)],
        model: Model,
        threshold: ThresholdPolicy,
    ) -> Result<Self> {
        let topology = AdjacencyList::new(n_vertices, edges)?;
        Ok(Self::from_topology(topology, model, threshold))
    }

    /// Create a network and populate every attribute with random defaults.
    ///
    /// # Errors
    /// Fails if the network has no vertices or `times` is not a valid range.
    pub fn with_defaults<R: Rng + ?Sized>(
        n_vertices: usize,
        edges: &[(usize, usize)],
        model: Model,
        threshold: ThresholdPolicy,
        times: TimeRange,
        rng: &mut R,
    ) -> Result<Self> {
        let mut network = Self::new(n_vertices, edges, model, threshold)?;
        network.initialize_defaults(times, rng)?;
        Ok(network)
    }
}

impl<G: Topology> Network<G> {
    /// Wrap an existing topology, with neutral attributes.
    pub fn from_topology(topology: G, model: Model, threshold: ThresholdPolicy) -> Self {
        let n_vertices = topology.n_vertices();
        let attack_decision = if n_vertices == 0 {
            0.0
        } else {
            1.0 / n_vertices as f64
        };
        // Absolute thresholds count neighbors and start at one.
        let threshold_value = match threshold {
            ThresholdPolicy::Absolute => 1.0,
            ThresholdPolicy::Relative | ThresholdPolicy::Probabilistic => 0.0,
        };
        let agents = vec![Agent::neutral(attack_decision, threshold_value); n_vertices];
        let rates = vec![0.0; topology.n_edges()];
        Self {
            model,
            threshold,
            isolated: IsolatedPolicy::default(),
            topology,
            agents,
            rates,
        }
    }

    /// Replace every attribute with random defaults.
    ///
    /// Countdowns are drawn uniformly from `times`, security and rates from
    /// `[0, 1)`, and thresholds from `[0, 1)` or from the integers `1..=4`
    /// under [`ThresholdPolicy::Absolute`]. All vertices become susceptible
    /// and the attack mass is split evenly.
    pub fn initialize_defaults<R: Rng + ?Sized>(
        &mut self,
        times: TimeRange,
        rng: &mut R,
    ) -> Result<()> {
        let n_vertices = self.n_vertices();
        if n_vertices == 0 {
            return Err(NetworkError::EmptyNetwork);
        }
        times.validate()?;

        let time_dist = Uniform::new(times.start, times.stop).map_err(|_| {
            NetworkError::InvalidTimeRange {
                start: times.start,
                stop: times.stop,
            }
        })?;
        let attack_decision = 1.0 / n_vertices as f64;

        for agent in &mut self.agents {
            let infectious_time = time_dist.sample(rng);
            let recovered_time = time_dist.sample(rng);
            let threshold_value = match self.threshold {
                ThresholdPolicy::Absolute => rng.random_range(1..5) as f64,
                ThresholdPolicy::Relative | ThresholdPolicy::Probabilistic => rng.random(),
            };
            *agent = Agent {
                infectious_time,
                initial_infectious_time: infectious_time,
                recovered_time,
                initial_recovered_time: recovered_time,
                security: rng.random(),
                utility: 0.0,
                threshold_value,
                attack_decision,
                compartment: Compartment::Susceptible,
                layer: None,
            };
        }
        for rate in &mut self.rates {
            *rate = rng.random();
        }

        Ok(())
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn threshold(&self) -> ThresholdPolicy {
        self.threshold
    }

    pub fn isolated(&self) -> IsolatedPolicy {
        self.isolated
    }

    pub fn set_isolated(&mut self, isolated: IsolatedPolicy) {
        self.isolated = isolated;
    }

    pub fn topology(&self) -> &G {
        &self.topology
    }

    pub fn n_vertices(&self) -> usize {
        self.agents.len()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, v: usize) -> Result<&Agent> {
        self.agents.get(v).ok_or(NetworkError::VertexOutOfRange {
            vertex: v,
            n_vertices: self.agents.len(),
        })
    }

    pub(crate) fn check_vertex(&self, v: usize) -> Result<()> {
        self.agent(v).map(|_| ())
    }

    fn agent_mut(&mut self, v: usize) -> Result<&mut Agent> {
        let n_vertices = self.agents.len();
        self.agents
            .get_mut(v)
            .ok_or(NetworkError::VertexOutOfRange {
                vertex: v,
                n_vertices,
            })
    }

    /// Visualization color of a vertex: white, black or grey for S, I or R.
    pub fn render_state(&self, v: usize) -> Result<[f64; 4]> {
        Ok(self.agent(v)?.compartment.color())
    }

    pub(crate) fn edge(&self, u: usize, v: usize) -> Result<usize> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        self.topology
            .edge_index(u, v)
            .ok_or(NetworkError::NoSuchEdge(u, v))
    }

    pub fn rate(&self, u: usize, v: usize) -> Result<f64> {
        Ok(self.rates[self.edge(u, v)?])
    }

    pub fn set_rate(&mut self, u: usize, v: usize, rate: f64) -> Result<()> {
        let i_edge = self.edge(u, v)?;
        check_unit("rate", rate)?;
        self.rates[i_edge] = rate;
        Ok(())
    }

    pub fn set_security(&mut self, v: usize, security: f64) -> Result<()> {
        check_unit("security", security)?;
        self.agent_mut(v)?.security = security;
        Ok(())
    }

    pub fn set_attack_decision(&mut self, v: usize, attack_decision: f64) -> Result<()> {
        check_unit("attack decision", attack_decision)?;
        self.agent_mut(v)?.attack_decision = attack_decision;
        Ok(())
    }

    /// Set the contagion threshold of a vertex.
    ///
    /// The value must be a positive integer under [`ThresholdPolicy::Absolute`]
    /// and a fraction in `[0, 1]` otherwise.
    pub fn set_threshold_value(&mut self, v: usize, threshold_value: f64) -> Result<()> {
        check_threshold(self.threshold, threshold_value)?;
        self.agent_mut(v)?.threshold_value = threshold_value;
        Ok(())
    }

    /// Set both the remaining and the full infectious duration of a vertex.
    pub fn set_infectious_time(&mut self, v: usize, time: u32) -> Result<()> {
        check_time("infectious time", time)?;
        let agent = self.agent_mut(v)?;
        agent.infectious_time = time;
        agent.initial_infectious_time = time;
        Ok(())
    }

    /// Set both the remaining and the full recovered duration of a vertex.
    pub fn set_recovered_time(&mut self, v: usize, time: u32) -> Result<()> {
        check_time("recovered time", time)?;
        let agent = self.agent_mut(v)?;
        agent.recovered_time = time;
        agent.initial_recovered_time = time;
        Ok(())
    }

    pub fn set_utility(&mut self, v: usize, utility: f64) -> Result<()> {
        self.agent_mut(v)?.utility = utility;
        Ok(())
    }

    pub fn add_utility(&mut self, v: usize, payoff: f64) -> Result<()> {
        self.agent_mut(v)?.utility += payoff;
        Ok(())
    }

    pub fn set_layer(&mut self, v: usize, layer: Option<i32>) -> Result<()> {
        self.agent_mut(v)?.layer = layer;
        Ok(())
    }

    /// Force a vertex into the infectious compartment, bypassing the infection policy.
    pub fn seed_infection(&mut self, v: usize) -> Result<()> {
        self.agent_mut(v)?.compartment = Compartment::Infectious;
        Ok(())
    }

    /// Ids of all vertices currently in `compartment`.
    pub fn select(&self, compartment: Compartment) -> Vec<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.compartment == compartment)
            .map(|(v, _)| v)
            .collect()
    }

    /// Check that the attribute storage matches the topology, that every
    /// countdown is positive and that every threshold fits the policy.
    pub fn check_invariants(&self) -> Result<()> {
        if self.agents.len() != self.topology.n_vertices() {
            return Err(NetworkError::Invariant(format!(
                "{} agents for {} vertices",
                self.agents.len(),
                self.topology.n_vertices()
            )));
        }
        if self.rates.len() != self.topology.n_edges() {
            return Err(NetworkError::Invariant(format!(
                "{} rates for {} edges",
                self.rates.len(),
                self.topology.n_edges()
            )));
        }
        for (v, agent) in self.agents.iter().enumerate() {
            if agent.infectious_time == 0 || agent.recovered_time == 0 {
                return Err(NetworkError::Invariant(format!(
                    "vertex {v} has an expired countdown"
                )));
            }
            if check_threshold(self.threshold, agent.threshold_value).is_err() {
                return Err(NetworkError::Invariant(format!(
                    "vertex {v} has threshold {} under the {} policy",
                    agent.threshold_value, self.threshold
                )));
            }
        }
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(NetworkError::InvalidAttribute { name, value });
    }
    Ok(())
}

fn check_threshold(policy: ThresholdPolicy, value: f64) -> Result<()> {
    match policy {
        ThresholdPolicy::Absolute => {
            if value < 1.0 || value.fract() != 0.0 {
                return Err(NetworkError::InvalidAttribute {
                    name: "threshold value",
                    value,
                });
            }
            Ok(())
        }
        ThresholdPolicy::Relative | ThresholdPolicy::Probabilistic => {
            check_unit("threshold value", value)
        }
    }
}

fn check_time(name: &'static str, time: u32) -> Result<()> {
    if time == 0 {
        return Err(NetworkError::InvalidAttribute {
            name,
            value: time as f64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn defaults_respect_domains() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let edges = [(0, 1), (1, 2), (2, 3)];
        let times = TimeRange { start: 2, stop: 6 };
        let network = Network::with_defaults(
            4,
            &edges,
            Model::Sirs,
            ThresholdPolicy::Absolute,
            times,
            &mut rng,
        )
        .unwrap();

        for agent in network.agents() {
            assert!((2..6).contains(&agent.infectious_time()));
            assert_eq!(agent.infectious_time(), agent.initial_infectious_time());
            assert!((2..6).contains(&agent.recovered_time()));
            assert_eq!(agent.recovered_time(), agent.initial_recovered_time());
            assert!((0.0..1.0).contains(&agent.security()));
            assert!([1.0, 2.0, 3.0, 4.0].contains(&agent.threshold_value()));
            assert_eq!(agent.attack_decision(), 0.25);
            assert_eq!(agent.utility(), 0.0);
            assert!(agent.is_susceptible());
            assert_eq!(agent.layer(), None);
        }
        for &(u, v) in &edges {
            assert!((0.0..1.0).contains(&network.rate(u, v).unwrap()));
        }
        assert_eq!(network.render_state(0).unwrap(), COLOR_S);
        network.check_invariants().unwrap();
    }

    #[test]
    fn default_initialization_rejects_empty_network() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let result = Network::with_defaults(
            0,
            &[],
            Model::Sir,
            ThresholdPolicy::Relative,
            TimeRange::default(),
            &mut rng,
        );
        assert_eq!(result, Err(NetworkError::EmptyNetwork));
        assert!(Network::new(0, &[], Model::Sir, ThresholdPolicy::Relative).is_ok());
    }

    #[test]
    fn default_initialization_rejects_bad_range() {
        let mut network =
            Network::new(2, &[(0, 1)], Model::Sir, ThresholdPolicy::Relative).unwrap();
        let before = network.clone();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let err = network
            .initialize_defaults(TimeRange { start: 5, stop: 5 }, &mut rng)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(network, before);
    }

    #[test]
    fn unknown_threshold_policy_is_configuration_error() {
        assert_eq!(
            "absolute".parse::<ThresholdPolicy>(),
            Ok(ThresholdPolicy::Absolute)
        );
        let err = "majority".parse::<ThresholdPolicy>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn setters_validate_before_mutating() {
        let mut network =
            Network::new(2, &[(0, 1)], Model::Sir, ThresholdPolicy::Absolute).unwrap();
        assert!(network.set_security(0, 1.5).is_err());
        assert!(network.set_threshold_value(0, 0.5).is_err());
        assert!(network.set_infectious_time(1, 0).is_err());
        assert!(network.set_rate(0, 2, 0.5).unwrap_err().is_topology());
        assert_eq!(network.agent(0).unwrap().security(), 0.0);

        network.set_threshold_value(0, 2.0).unwrap();
        network.set_rate(1, 0, 0.25).unwrap();
        assert_eq!(network.rate(0, 1).unwrap(), 0.25);
        assert_eq!(network.agent(0).unwrap().threshold_value(), 2.0);
    }

    #[test]
    fn neutral_threshold_fits_policy() {
        for threshold in [
            ThresholdPolicy::Relative,
            ThresholdPolicy::Absolute,
            ThresholdPolicy::Probabilistic,
        ] {
            let network = Network::new(3, &[(0, 1), (1, 2)], Model::Sir, threshold).unwrap();
            network.check_invariants().unwrap();
        }
        let network =
            Network::new(2, &[(0, 1)], Model::Sir, ThresholdPolicy::Absolute).unwrap();
        assert_eq!(network.agent(1).unwrap().threshold_value(), 1.0);
    }
}
