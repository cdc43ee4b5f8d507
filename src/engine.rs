use crate::config::Config;
use crate::graph::Topology;
use crate::network::{Compartment, Network};
use crate::record::Record;
use crate::topology::{TopologyKind, erdos_renyi, star};
use anyhow::{Context, Result};
use rand::{prelude::*, seq::index};
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, the network, the random number generator and the
/// current step, and drives the network one tick at a time.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    network: Network,
    rng: ChaCha12Rng,
    step: usize,
}

/// Aggregate metrics and network effect of one vertex.
#[derive(Debug)]
pub struct Probe {
    pub vertex: usize,
    pub security: f64,
    pub infection_probability: f64,
    pub network_effect: f64,
    pub record: Record,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial state.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let mut rng = match cfg.init.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let n_vertices = cfg.topology.n_vertices;
        let edges = match cfg.topology.kind {
            TopologyKind::ErdosRenyi => erdos_renyi(n_vertices, cfg.topology.edge_prob, &mut rng)
                .context("failed to generate Erdős–Rényi graph")?,
            TopologyKind::Star => star(n_vertices),
        };
        log::info!("generated {n_vertices} vertices and {} edges", edges.len());

        let mut network = Network::with_defaults(
            n_vertices,
            &edges,
            cfg.model.model,
            cfg.model.threshold,
            cfg.init.times(),
            &mut rng,
        )
        .context("failed to construct network")?;
        network.set_isolated(cfg.model.isolated);

        // Infect a random subset of vertices to start the outbreak.
        for v in index::sample(&mut rng, n_vertices, cfg.init.n_seed) {
            network.seed_infection(v)?;
        }

        Ok(Self {
            cfg,
            network,
            rng,
            step: 0,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Run the simulation and save the resulting records to a binary file.
    pub fn run_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        for i_save in 0..self.cfg.output.saves_per_file {
            for _ in 0..self.cfg.output.steps_per_save {
                self.perform_step().context("failed to perform step")?;
            }

            let record = self.record().context("failed to record state")?;
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.output.saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    /// Compute the network effect on `vertex` along with the current aggregate metrics.
    pub fn probe(&mut self, vertex: usize) -> Result<Probe> {
        let security = self
            .network
            .agent(vertex)
            .context("failed to find probe vertex")?
            .security();
        let infection_probability = self
            .network
            .compute_infection_probability(vertex, &mut self.rng)
            .context("failed to compute infection probability")?;
        let record = self.record()?;
        Ok(Probe {
            vertex,
            security,
            infection_probability,
            network_effect: (1.0 - security) * infection_probability,
            record,
        })
    }

    fn perform_step(&mut self) -> Result<()> {
        // Attack susceptible vertices with the pre-step infectious set.
        let infected = self
            .attack_susceptible()
            .context("failed to attack susceptible vertices")?;

        // Count down infectious and recovered timers.
        let waning = self.cfg.model.model.has_waning_immunity();
        let transitions = self
            .network
            .tick(waning)
            .context("failed to advance epidemic clock")?;

        self.step += 1;
        log::debug!(
            "step {}: {} infected, {} recovered, {} susceptible",
            self.step,
            infected.len(),
            transitions.recovered.len(),
            transitions.susceptible.len()
        );

        Ok(())
    }

    fn attack_susceptible(&mut self) -> Result<Vec<usize>> {
        let network = &self.network;
        let complex = self.cfg.model.complex;
        let decision = &self.cfg.model.sigmoid;

        // Decide every attempt before applying any of them.
        let mut infected = Vec::new();
        for v in network.select(Compartment::Susceptible) {
            let sources: Vec<usize> = network
                .topology()
                .neighbors(v)
                .iter()
                .copied()
                .filter(|&u| network.agents()[u].is_infectious())
                .collect();
            if sources.is_empty() {
                continue;
            }

            let attacked = if complex {
                true
            } else {
                let mut attacked = false;
                for &u in &sources {
                    let attack_dist = Bernoulli::new(network.transmissibility(u, v)?)?;
                    if attack_dist.sample(&mut self.rng) {
                        attacked = true;
                        break;
                    }
                }
                attacked
            };

            if attacked && network.evaluate_infection(v, complex, decision, &mut self.rng)? {
                infected.push(v);
            }
        }

        for &v in &infected {
            self.network.infect(v)?;
        }

        Ok(infected)
    }

    fn record(&mut self) -> Result<Record> {
        let network_effect = match self.cfg.output.probe_vertex {
            Some(vertex) => Some(
                self.network
                    .compute_network_effect(vertex, &mut self.rng)
                    .context("failed to compute network effect")?,
            ),
            None => None,
        };

        Ok(Record {
            step: self.step,
            counts: self.network.compartment_counts(),
            relative_size: self.network.relative_size()?,
            expected_infections: self.network.expected_infections(),
            social_welfare: self.network.social_welfare(),
            network_effect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InitConfig, ModelConfig, OutputConfig, TopologyConfig};
    use crate::infection::Sigmoid;
    use crate::network::{IsolatedPolicy, Model, ThresholdPolicy};

    fn config(complex: bool) -> Config {
        Config {
            model: ModelConfig {
                model: Model::Sirs,
                threshold: ThresholdPolicy::Relative,
                complex,
                isolated: IsolatedPolicy::Fail,
                sigmoid: Sigmoid::default(),
            },
            topology: TopologyConfig {
                kind: TopologyKind::ErdosRenyi,
                n_vertices: 24,
                edge_prob: 0.2,
            },
            init: InitConfig {
                start_time: 2,
                stop_time: 6,
                n_seed: 4,
                seed: Some(17),
            },
            output: OutputConfig {
                steps_per_save: 2,
                saves_per_file: 8,
                probe_vertex: None,
            },
        }
    }

    #[test]
    fn initial_condition_seeds_infections() {
        let engine = Engine::generate_initial_condition(config(false)).unwrap();
        let counts = engine.network().compartment_counts();
        assert_eq!(counts.infectious, 4);
        assert_eq!(counts.susceptible, 20);
        assert_eq!(engine.step(), 0);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        for complex in [false, true] {
            let mut engine_a = Engine::generate_initial_condition(config(complex)).unwrap();
            let mut engine_b = Engine::generate_initial_condition(config(complex)).unwrap();
            for _ in 0..10 {
                engine_a.perform_step().unwrap();
                engine_b.perform_step().unwrap();
            }
            assert_eq!(engine_a.network(), engine_b.network());
        }
    }

    #[test]
    fn zero_rate_edges_never_transmit() {
        let mut engine = Engine::generate_initial_condition(config(false)).unwrap();
        let edges = engine.network().topology().edges().to_vec();
        assert!(!edges.is_empty());
        for (u, v) in edges {
            engine.network.set_rate(u, v, 0.0).unwrap();
        }
        for v in 0..24 {
            engine.network.set_security(v, 0.0).unwrap();
        }

        let susceptible = engine.network().select(Compartment::Susceptible);
        assert!(engine.attack_susceptible().unwrap().is_empty());
        assert_eq!(engine.network().select(Compartment::Susceptible), susceptible);

        let mut n_infectious = engine.network().compartment_counts().infectious;
        for _ in 0..10 {
            engine.perform_step().unwrap();
            let counts = engine.network().compartment_counts();
            assert!(counts.infectious <= n_infectious);
            n_infectious = counts.infectious;
        }
    }

    #[test]
    fn steps_preserve_invariants() {
        let mut engine = Engine::generate_initial_condition(config(false)).unwrap();
        for _ in 0..20 {
            engine.perform_step().unwrap();
            engine.network().check_invariants().unwrap();
            let counts = engine.network().compartment_counts();
            assert_eq!(counts.susceptible + counts.infectious + counts.recovered, 24);
        }
        assert_eq!(engine.step(), 20);
    }
}
