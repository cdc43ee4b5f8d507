//! Topology generators.

use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

/// Kind of random or deterministic graph to build.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Every pair of vertices is joined independently with probability `edge_prob`.
    ErdosRenyi,
    /// Vertex 0 is joined to every other vertex.
    Star,
}

/// Edge list of an Erdős–Rényi graph `G(n, p)`.
pub fn erdos_renyi<R: Rng + ?Sized>(
    n_vertices: usize,
    edge_prob: f64,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>> {
    let edge_dist = Bernoulli::new(edge_prob).context("invalid edge probability")?;
    let mut edges = Vec::new();
    for u in 0..n_vertices {
        for v in (u + 1)..n_vertices {
            if edge_dist.sample(rng) {
                edges.push((u, v));
            }
        }
    }
    Ok(edges)
}

/// Edge list of a star graph centered on vertex 0.
pub fn star(n_vertices: usize) -> Vec<(usize, usize)> {
    (1..n_vertices).map(|v| (0, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn star_edges() {
        assert_eq!(star(4), vec![(0, 1), (0, 2), (0, 3)]);
        assert!(star(1).is_empty());
    }

    #[test]
    fn erdos_renyi_extremes() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        assert!(erdos_renyi(6, 0.0, &mut rng).unwrap().is_empty());
        assert_eq!(erdos_renyi(6, 1.0, &mut rng).unwrap().len(), 15);
        assert!(erdos_renyi(6, 1.5, &mut rng).is_err());
    }
}
