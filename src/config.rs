use crate::infection::Sigmoid;
use crate::network::{IsolatedPolicy, Model, ThresholdPolicy, TimeRange};
use crate::topology::TopologyKind;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Contagion parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Compartmental model family.
    #[serde(default)]
    pub model: Model,
    /// Threshold policy of complex contagion.
    #[serde(default)]
    pub threshold: ThresholdPolicy,
    /// Use complex (threshold) contagion instead of simple contagion.
    pub complex: bool,
    /// Outcome of degree-normalized thresholds on isolated vertices.
    #[serde(default)]
    pub isolated: IsolatedPolicy,
    /// Decision function of the probabilistic threshold policy.
    #[serde(default)]
    pub sigmoid: Sigmoid,
}

/// Network topology parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Graph generator.
    pub kind: TopologyKind,
    /// Number of vertices.
    pub n_vertices: usize,
    /// Edge probability of Erdős–Rényi graphs.
    #[serde(default)]
    pub edge_prob: f64,
}

/// Initial condition parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// First infectious/recovered duration that can be drawn.
    pub start_time: u32,
    /// One past the last infectious/recovered duration that can be drawn.
    pub stop_time: u32,
    /// Number of initially infectious vertices.
    pub n_seed: usize,
    /// Random seed (drawn from the OS if absent).
    pub seed: Option<u64>,
}

impl InitConfig {
    pub fn times(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            stop: self.stop_time,
        }
    }
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of steps between records.
    pub steps_per_save: usize,
    /// Number of records written per trajectory file.
    pub saves_per_file: usize,
    /// Vertex whose network effect is recorded at each save.
    pub probe_vertex: Option<usize>,
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub topology: TopologyConfig,
    pub init: InitConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.model.sigmoid.steepness, -1e3..=1e3)
            .context("invalid sigmoid steepness")?;
        check_num(self.model.sigmoid.midpoint, 0.0..=1.0).context("invalid sigmoid midpoint")?;

        let n_vertices = self.topology.n_vertices;
        check_num(n_vertices, 1..=10_000).context("invalid number of vertices")?;
        check_num(self.topology.edge_prob, 0.0..=1.0).context("invalid edge probability")?;

        check_num(self.init.start_time, 1..10_000).context("invalid start time")?;
        check_num(self.init.stop_time, self.init.start_time + 1..=10_000)
            .context("invalid stop time")?;
        check_num(self.init.n_seed, 0..=n_vertices).context("invalid number of seeds")?;

        check_num(self.output.steps_per_save, 1..10_000)
            .context("invalid number of steps per save")?;
        check_num(self.output.saves_per_file, 1..10_000)
            .context("invalid number of saves per file")?;
        if let Some(probe_vertex) = self.output.probe_vertex {
            check_num(probe_vertex, 0..n_vertices).context("invalid probe vertex")?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[model]
model = "sirs"
threshold = "absolute"
complex = true

[topology]
kind = "erdos_renyi"
n_vertices = 32
edge_prob = 0.1

[init]
start_time = 2
stop_time = 8
n_seed = 3
seed = 42

[output]
steps_per_save = 4
saves_per_file = 16
"#;

    #[test]
    fn parses_and_validates() {
        let config: Config = toml::from_str(CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.model.threshold, ThresholdPolicy::Absolute);
        assert_eq!(config.model.isolated, IsolatedPolicy::Fail);
        assert_eq!(config.model.sigmoid, Sigmoid::default());
        assert_eq!(config.topology.kind, TopologyKind::ErdosRenyi);
        assert_eq!(config.init.seed, Some(42));
        assert_eq!(config.output.probe_vertex, None);
    }

    #[test]
    fn rejects_unknown_threshold_policy() {
        let contents = CONFIG.replace("\"absolute\"", "\"majority\"");
        assert!(toml::from_str::<Config>(&contents).is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config: Config = toml::from_str(CONFIG).unwrap();
        config.init.n_seed = 33;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(CONFIG).unwrap();
        config.init.stop_time = 2;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(CONFIG).unwrap();
        config.output.probe_vertex = Some(32);
        assert!(config.validate().is_err());
    }
}
