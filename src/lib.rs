//! SIRS contagion on agent networks with a security-economics layer.
//!
//! The simulation core is [`Network`]: per-vertex compartments and countdowns,
//! the infection policies, the epidemic clock, the network-effect estimator and
//! the aggregate metrics. [`engine`], [`manager`] and [`analysis`] drive the core
//! tick by tick and persist its trajectory.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod graph;
pub mod infection;
pub mod manager;
pub mod metrics;
pub mod network;
pub mod record;
pub mod stats;
pub mod topology;

pub use error::NetworkError;
pub use graph::{AdjacencyList, Topology};
pub use infection::{Decision, Sigmoid};
pub use network::{Compartment, IsolatedPolicy, Model, Network, ThresholdPolicy, TimeRange};
