use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use num::{Num, ToPrimitive};
use rand::Rng;

/// Vertices are identified by arbitrary (not necessarily contiguous)
/// integers supplied by the caller.
pub type VertexId = i64;

/// Read-only view of a finite weighted undirected graph.
///
/// The matcher consumes any type implementing this trait; it never mutates
/// the graph and never calls `weight` unless `has_edge` holds for the pair.
pub trait WeightedGraph {
    /// The unique vertex identifiers. Order does not matter.
    fn vertex_ids(&self) -> Vec<VertexId>;

    /// Whether an edge joins `u` and `v`. Must be symmetric.
    fn has_edge(&self, u: VertexId, v: VertexId) -> bool;

    /// Weight of the edge between `u` and `v`. Any finite real is allowed,
    /// zero and negative weights included. Undefined when `has_edge` is
    /// false.
    fn weight(&self, u: VertexId, v: VertexId) -> f64;
}

/// Sparse graph over arbitrary vertex ids, stored as a sorted edge map.
///
/// BTree storage keeps iteration order deterministic, which in turn keeps
/// the matcher's output reproducible run to run.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    vertices: BTreeSet<VertexId>,
    edges: BTreeMap<(VertexId, VertexId), f64>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(u, v, weight)` triples. The vertex set is the
    /// set of endpoints mentioned by the edges.
    pub fn from_edges<W>(weighted_edges: &[(VertexId, VertexId, W)]) -> Self
    where
        W: Copy + Num + ToPrimitive,
    {
        let mut graph = Self::new();
        for &(u, v, w) in weighted_edges {
            graph.add_edge(u, v, w.to_f64().expect("weight not representable as f64"));
        }
        graph
    }

    /// Same as `from_edges`, but with an explicit vertex set so isolated
    /// vertices can exist.
    pub fn from_edges_and_vertices<W>(
        weighted_edges: &[(VertexId, VertexId, W)],
        vertices: &[VertexId],
    ) -> Self
    where
        W: Copy + Num + ToPrimitive,
    {
        let mut graph = Self::from_edges(weighted_edges);
        for &v in vertices {
            graph.add_vertex(v);
        }
        graph
    }

    pub fn add_vertex(&mut self, v: VertexId) {
        self.vertices.insert(v);
    }

    /// Insert an undirected edge, replacing any previous weight for the
    /// pair.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId, weight: f64) {
        if u == v {
            panic!("self-loop on vertex {}", u);
        }
        self.vertices.insert(u);
        self.vertices.insert(v);
        self.edges.insert(Self::key(u, v), weight);
    }

    fn key(u: VertexId, v: VertexId) -> (VertexId, VertexId) {
        (u.min(v), u.max(v))
    }
}

impl WeightedGraph for AdjacencyGraph {
    fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().copied().collect()
    }

    fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.edges.contains_key(&Self::key(u, v))
    }

    fn weight(&self, u: VertexId, v: VertexId) -> f64 {
        self.edges[&Self::key(u, v)]
    }
}

/// Dense graph over vertices `0..n`, backed by an adjacency matrix.
///
/// Suited to the near-complete instances the random harness produces, where
/// a matrix lookup beats a map probe.
#[derive(Clone, Debug)]
pub struct MatrixGraph {
    n: usize,
    weights: Array2<f64>,
    present: Array2<bool>,
}

impl MatrixGraph {
    pub fn new(n: usize) -> Self {
        MatrixGraph {
            n,
            weights: Array2::from_elem((n, n), 0.0),
            present: Array2::from_elem((n, n), false),
        }
    }

    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) {
        if u == v {
            panic!("self-loop on vertex {}", u);
        }
        self.weights[[u, v]] = weight;
        self.weights[[v, u]] = weight;
        self.present[[u, v]] = true;
        self.present[[v, u]] = true;
    }

    /// A random instance: every pair becomes an edge with probability
    /// `density`, weighted uniformly in `[1, max_weight]`.
    pub fn random<R: Rng>(n: usize, density: f64, max_weight: f64, rng: &mut R) -> Self {
        let mut graph = Self::new(n);
        for u in 0..n {
            for v in u + 1..n {
                if rng.gen_bool(density) {
                    graph.add_edge(u, v, rng.gen_range(1.0..=max_weight));
                }
            }
        }
        graph
    }
}

impl WeightedGraph for MatrixGraph {
    fn vertex_ids(&self) -> Vec<VertexId> {
        (0..self.n as VertexId).collect()
    }

    fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        let in_range = |x: VertexId| x >= 0 && (x as usize) < self.n;
        in_range(u) && in_range(v) && self.present[[u as usize, v as usize]]
    }

    fn weight(&self, u: VertexId, v: VertexId) -> f64 {
        self.weights[[u as usize, v as usize]]
    }
}
