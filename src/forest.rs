use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{VertexId, WeightedGraph};
use crate::node::{Arena, Label, NodeId};

/// Whole state of one matching computation: the node arena, the forest of
/// alternating trees and the matching built so far. Owned by a single call
/// to the driver and dropped on return.
pub struct Forest<'a, G: WeightedGraph> {
    pub(crate) graph: &'a G,
    pub(crate) arena: Arena,
    // every atomic vertex as an (input id, node) pair, ascending by id, so
    // pair scans are deterministic and can index both sides
    pub(crate) scan: Vec<(VertexId, NodeId)>,
    pub(crate) roots: BTreeSet<NodeId>,
    // symmetric, atom-level: when a blossom is matched, the entry is the
    // atomic endpoint of the underlying tight edge
    pub(crate) matching: BTreeMap<NodeId, NodeId>,
}

impl<'a, G: WeightedGraph> Forest<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        let ids: Vec<VertexId> = {
            let unique: BTreeSet<VertexId> = graph.vertex_ids().into_iter().collect();
            unique.into_iter().collect()
        };

        // Seeding every dual with half the smallest edge weight keeps all
        // initial slacks non-negative for arbitrary real weights, negative
        // ones included.
        let mut w_min: Option<f64> = None;
        for (i, &u) in ids.iter().enumerate() {
            for &v in &ids[i + 1..] {
                if graph.has_edge(u, v) {
                    let w = graph.weight(u, v);
                    w_min = Some(w_min.map_or(w, |m| m.min(w)));
                }
            }
        }
        let initial_dual = w_min.unwrap_or(0.0) / 2.0;

        let mut arena = Arena::new();
        let mut scan = Vec::with_capacity(ids.len());
        let mut roots = BTreeSet::new();
        for &id in &ids {
            let n = arena.new_atomic(id, initial_dual);
            scan.push((id, n));
            roots.insert(n);
        }
        Forest {
            graph,
            arena,
            scan,
            roots,
            matching: BTreeMap::new(),
        }
    }

    pub fn vertex_of(&self, n: NodeId) -> VertexId {
        self.arena[n].vertex.expect("handle does not name an atomic node")
    }

    pub fn matched_count(&self) -> usize {
        self.matching.len()
    }

    /// Slack of the underlying edge between atoms `u` and `v`: the weight
    /// minus the duals of both nesting chains, truncated at the first node
    /// containing both endpoints.
    pub fn slack(&self, u: NodeId, v: NodeId) -> f64 {
        let mut s = self.graph.weight(self.vertex_of(u), self.vertex_of(v));
        let cu = self.arena.chain(u);
        let cv = self.arena.chain(v);
        for &x in cu.iter().take_while(|&&x| !cv.contains(&x)) {
            s -= self.arena[x].dual;
        }
        for &x in cv.iter().take_while(|&&x| !cu.contains(&x)) {
            s -= self.arena[x].dual;
        }
        s
    }

    /// The atom of outer node `b` that is matched outside `b`, together
    /// with its partner. `None` when `b` is unmatched.
    pub fn tight_with(&self, b: NodeId) -> Option<(NodeId, NodeId)> {
        for a in self.arena.atoms(b) {
            if let Some(&m) = self.matching.get(&a) {
                if self.arena.outer(m) != b {
                    return Some((a, m));
                }
            }
        }
        None
    }

    /// Record the matched pair `(u, v)` and re-match the interior of every
    /// blossom level below `bound` accordingly: each cycle is rotated to
    /// start at the sub-blossom holding the new endpoint and the remaining
    /// sub-blossoms are matched pairwise along the cycle edges.
    pub fn set_tight(&mut self, u: NodeId, v: NodeId, bound: Option<NodeId>) {
        self.matching.insert(u, v);
        self.matching.insert(v, u);
        for a in [u, v] {
            self.propagate_interior(a, bound);
        }
    }

    fn propagate_interior(&mut self, a: NodeId, bound: Option<NodeId>) {
        let mut inner = a;
        while self.arena[inner].blossom != bound {
            let lb = self.arena[inner]
                .blossom
                .expect("bound is not a containing blossom of the endpoint");
            let entry = self.arena.blossom_within(inner, lb);
            let pos = self.arena[lb]
                .cycle
                .iter()
                .position(|&(s, _)| self.arena.blossom_within(s, lb) == entry)
                .expect("entry sub-blossom missing from its own cycle");
            self.arena[lb].cycle.rotate_left(pos);
            let cycle = self.arena[lb].cycle.clone();
            let mut i = 1;
            while i + 1 < cycle.len() {
                let (s, t) = cycle[i];
                self.set_tight(s, t, Some(lb));
                i += 2;
            }
            inner = lb;
        }
    }

    /// Drop the matched pair involving `a`, if any.
    pub fn unmatch(&mut self, a: NodeId) {
        if let Some(m) = self.matching.remove(&a) {
            self.matching.remove(&m);
        }
    }

    /// Release a node from the forest: label `Free`, no tree links, and the
    /// same recursively for everything contracted inside it.
    pub fn free(&mut self, n: NodeId) {
        self.arena[n].label = Label::Free;
        self.arena[n].parent = None;
        self.arena[n].children.clear();
        self.roots.remove(&n);
        let cycle = self.arena[n].cycle.clone();
        for (s, _) in cycle {
            let sub = self.arena.blossom_within(s, n);
            self.free(sub);
        }
    }

    /// Every node the computation currently knows about: atoms plus all
    /// live blossoms at any nesting depth, deduplicated.
    #[cfg(debug_assertions)]
    fn live_nodes(&self) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for &(_, n) in &self.scan {
            for x in self.arena.chain(n) {
                if seen.insert(x) {
                    out.push(x);
                }
            }
        }
        out
    }

    /// Sum of the duals of every live node. Equal to the total matched
    /// weight once the matching is perfect.
    #[cfg(debug_assertions)]
    pub fn dual_objective(&self) -> f64 {
        self.live_nodes().iter().map(|&x| self.arena[x].dual).sum()
    }

    /// Assert every structural invariant. Runs after each primal operation
    /// in debug builds; a failure here is an implementation bug, never an
    /// input error.
    #[cfg(debug_assertions)]
    pub fn verify(&self) {
        use crate::EPS;

        for (i, &(ui, un)) in self.scan.iter().enumerate() {
            for &(vi, vn) in &self.scan[i + 1..] {
                if !self.graph.has_edge(ui, vi) {
                    continue;
                }
                let s = self.slack(un, vn);
                assert!(s >= -EPS, "negative slack {} on edge ({}, {})", s, ui, vi);
            }
        }

        for (&a, &b) in &self.matching {
            assert_eq!(self.matching.get(&b), Some(&a), "matching map not symmetric");
            if a < b {
                let (va, vb) = (self.vertex_of(a), self.vertex_of(b));
                assert!(self.graph.has_edge(va, vb), "matched pair ({}, {}) off-graph", va, vb);
                let s = self.slack(a, b);
                assert!(s.abs() <= EPS, "matched edge ({}, {}) not tight: {}", va, vb, s);
            }
        }

        for &r in &self.roots {
            assert_eq!(self.arena[r].label, Label::Plus, "root without a plus label");
            assert!(self.arena[r].parent.is_none(), "root with a parent link");
            self.verify_alternation(r);
        }

        for x in self.live_nodes() {
            let node = &self.arena[x];
            if node.is_blossom() {
                assert!(
                    node.cycle.len() >= 3 && node.cycle.len() % 2 == 1,
                    "blossom with an even cycle of {}",
                    node.cycle.len()
                );
                assert!(node.dual >= -EPS, "blossom dual fell below zero: {}", node.dual);
            }
        }
    }

    #[cfg(debug_assertions)]
    fn verify_alternation(&self, n: NodeId) {
        let want = match self.arena[n].label {
            Label::Plus => Label::Minus,
            Label::Minus => Label::Plus,
            Label::Free => panic!("free node inside a tree"),
        };
        for &c in &self.arena[n].children {
            let child = self.arena.outer(c);
            assert_eq!(self.arena[child].label, want, "label alternation broken");
            let p = self.arena[child].parent.expect("tree child without a parent link");
            assert_eq!(self.arena.outer(p), n, "child's parent link leaves the edge");
            self.verify_alternation(child);
        }
    }
}
