//! Graph substrate.
//!
//! The network only talks to its topology through the [`Topology`] trait, so any
//! storage that can answer adjacency queries and enumerate simple paths can be
//! plugged in. [`AdjacencyList`] is the implementation used by the engine.

use crate::error::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// Read-only view of an undirected graph with stable vertex and edge ids.
pub trait Topology {
    /// Number of vertices. Vertex ids are `0..n_vertices()`.
    fn n_vertices(&self) -> usize;

    /// Number of edges. Edge ids are `0..n_edges()`.
    fn n_edges(&self) -> usize;

    /// Neighbors of a vertex.
    fn neighbors(&self, v: usize) -> &[usize];

    /// Id of the edge between `u` and `v`, if they are adjacent.
    fn edge_index(&self, u: usize, v: usize) -> Option<usize>;

    /// Number of neighbors of a vertex.
    fn degree(&self, v: usize) -> usize {
        self.neighbors(v).len()
    }

    /// Call `f` once for every simple path from `src` to `dst` that only visits
    /// vertices marked in `visible`.
    ///
    /// Each path is passed as the ordered sequence of vertex ids, endpoints
    /// included. A path from a vertex to itself is never reported.
    fn for_each_simple_path(
        &self,
        src: usize,
        dst: usize,
        visible: &[bool],
        f: &mut dyn FnMut(&[usize]),
    ) {
        if src == dst || !visible[src] || !visible[dst] {
            return;
        }
        let mut path = vec![src];
        let mut on_path = vec![false; self.n_vertices()];
        on_path[src] = true;
        extend_paths(self, dst, visible, &mut path, &mut on_path, f);
    }
}

fn extend_paths<T: Topology + ?Sized>(
    topology: &T,
    dst: usize,
    visible: &[bool],
    path: &mut Vec<usize>,
    on_path: &mut [bool],
    f: &mut dyn FnMut(&[usize]),
) {
    let Some(&last) = path.last() else {
        return;
    };
    for &next in topology.neighbors(last) {
        if on_path[next] || !visible[next] {
            continue;
        }
        path.push(next);
        if next == dst {
            f(path.as_slice());
        } else {
            on_path[next] = true;
            extend_paths(topology, dst, visible, path, on_path, f);
            on_path[next] = false;
        }
        path.pop();
    }
}

/// Undirected graph stored as per-vertex neighbor lists.
///
/// `incident[v][k]` is the id of the edge joining `v` and `neighbors[v][k]`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AdjacencyList {
    neighbors: Vec<Vec<usize>>,
    incident: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
}

impl AdjacencyList {
    /// Build a graph from a vertex count and an edge list.
    ///
    /// # Errors
    /// Fails if an endpoint is out of range, an edge is a self-loop, or the
    /// same pair of vertices appears twice.
    pub fn new(n_vertices: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut graph = Self {
            neighbors: vec![Vec::new(); n_vertices],
            incident: vec![Vec::new(); n_vertices],
            edges: Vec::with_capacity(edges.len()),
        };
        for &(u, v) in edges {
            for w in [u, v] {
                if w >= n_vertices {
                    return Err(NetworkError::VertexOutOfRange {
                        vertex: w,
                        n_vertices,
                    });
                }
            }
            if u == v {
                return Err(NetworkError::SelfLoop(u));
            }
            if graph.edge_index(u, v).is_some() {
                return Err(NetworkError::DuplicateEdge(u, v));
            }
            let i_edge = graph.edges.len();
            graph.edges.push((u, v));
            graph.neighbors[u].push(v);
            graph.incident[u].push(i_edge);
            graph.neighbors[v].push(u);
            graph.incident[v].push(i_edge);
        }
        Ok(graph)
    }

    /// Endpoints of every edge, indexed by edge id.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

impl Topology for AdjacencyList {
    fn n_vertices(&self) -> usize {
        self.neighbors.len()
    }

    fn n_edges(&self) -> usize {
        self.edges.len()
    }

    fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    fn edge_index(&self, u: usize, v: usize) -> Option<usize> {
        let pos = self.neighbors.get(u)?.iter().position(|&w| w == v)?;
        Some(self.incident[u][pos])
    }
}
