//! Error types of the simulation core.

use thiserror::Error;

/// Errors raised by the network, the infection policy, the clock and the estimator.
///
/// Every check runs before any attribute is touched, so a returned error never
/// leaves the network partially updated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Threshold policy name not recognized.
    #[error("unknown threshold policy {0:?}")]
    UnknownThresholdPolicy(String),

    /// Operation undefined on a network without vertices.
    #[error("network has no vertices")]
    EmptyNetwork,

    /// Countdown range is empty or starts below one.
    #[error("time range must satisfy 1 <= start < stop, but is {start}..{stop}")]
    InvalidTimeRange { start: u32, stop: u32 },

    /// Attribute value outside of its domain.
    #[error("invalid {name}: {value}")]
    InvalidAttribute { name: &'static str, value: f64 },

    /// Vertex id not present in the network.
    #[error("vertex {vertex} out of range (network has {n_vertices} vertices)")]
    VertexOutOfRange { vertex: usize, n_vertices: usize },

    /// The two vertices are not adjacent.
    #[error("no edge between {0} and {1}")]
    NoSuchEdge(usize, usize),

    /// Edge from a vertex to itself.
    #[error("self-loop on vertex {0}")]
    SelfLoop(usize),

    /// Edge listed more than once.
    #[error("duplicate edge between {0} and {1}")]
    DuplicateEdge(usize, usize),

    /// Degree-normalized threshold evaluated on a vertex without neighbors.
    #[error("vertex {0} has no neighbors")]
    IsolatedVertex(usize),

    /// Internal state is inconsistent.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl NetworkError {
    /// Whether the error stems from invalid configuration or attribute values.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownThresholdPolicy(_)
                | Self::EmptyNetwork
                | Self::InvalidTimeRange { .. }
                | Self::InvalidAttribute { .. }
        )
    }

    /// Whether the error stems from the network topology.
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            Self::VertexOutOfRange { .. }
                | Self::NoSuchEdge(..)
                | Self::SelfLoop(_)
                | Self::DuplicateEdge(..)
                | Self::IsolatedVertex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
