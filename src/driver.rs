use std::collections::BTreeSet;

use log::trace;

use crate::error::MatchingError;
use crate::forest::Forest;
use crate::graph::{VertexId, WeightedGraph};
use crate::node::{Label, NodeId};
use crate::EPS;

/// Result of a successful matching run.
#[derive(Clone, Debug, PartialEq)]
pub struct PerfectMatching {
    /// Matched vertex pairs, each `(min, max)`, ascending by first
    /// component.
    pub pairs: Vec<(VertexId, VertexId)>,
    /// Sum of the matched edge weights.
    pub weight: f64,
}

// One applicable primal operation, named by the atoms of the edge that
// triggers it (or the blossom to expand).
#[derive(Clone, Copy, Debug)]
enum Action {
    Grow(NodeId, NodeId),
    Augment(NodeId, NodeId),
    Shrink(NodeId, NodeId),
    Expand(NodeId),
}

/// Compute a minimum-weight perfect matching of `graph`.
///
/// Returns the matched pairs and their total weight, or an error when the
/// vertex count is odd or the graph has no perfect matching at all. The
/// computation is pure from the caller's perspective: the graph is only
/// read, and all working state dies with the call.
pub fn minimum_weight_perfect_matching<G: WeightedGraph>(
    graph: &G,
) -> Result<PerfectMatching, MatchingError> {
    let mut forest = Forest::new(graph);
    let n = forest.scan.len();
    if n % 2 == 1 {
        return Err(MatchingError::OddVertexCount(n));
    }

    while forest.matched_count() < n {
        let (delta, action) = match forest.next_action() {
            Some(found) => found,
            None => return Err(MatchingError::Infeasible),
        };
        if delta < -EPS {
            return Err(MatchingError::Infeasible);
        }
        trace!("delta {}", delta);
        if delta > EPS {
            forest.update_duals(delta);
        }
        match action {
            Action::Grow(u, v) => forest.grow(u, v),
            Action::Augment(u, v) => forest.augment(u, v),
            Action::Shrink(u, v) => forest.shrink(u, v),
            Action::Expand(b) => forest.expand(b),
        }
        #[cfg(debug_assertions)]
        forest.verify();
    }

    let result = forest.collect_pairs();
    #[cfg(debug_assertions)]
    {
        let objective = forest.dual_objective();
        debug_assert!(
            (result.weight - objective).abs() <= (n as f64 + 1.0) * EPS * 8.0,
            "matched weight {} does not meet the dual objective {}",
            result.weight,
            objective
        );
    }
    Ok(result)
}

impl<'a, G: WeightedGraph> Forest<'a, G> {
    /// Scan every cross-outer edge and every outer `Minus` blossom for the
    /// smallest dual increment that makes some primal operation
    /// applicable.
    ///
    /// Within a category the first candidate in ascending `(min, max)`
    /// vertex order wins, and categories tie-break in the order AUGMENT,
    /// SHRINK, GROW, EXPAND, so runs are reproducible.
    fn next_action(&self) -> Option<(f64, Action)> {
        let mut grow: Option<(f64, Action)> = None;
        let mut augment: Option<(f64, Action)> = None;
        let mut shrink: Option<(f64, Action)> = None;
        let mut expand: Option<(f64, Action)> = None;

        for (i, &(ui, un)) in self.scan.iter().enumerate() {
            for &(vi, vn) in &self.scan[i + 1..] {
                if !self.graph.has_edge(ui, vi) {
                    continue;
                }
                let u_out = self.arena.outer(un);
                let v_out = self.arena.outer(vn);
                if u_out == v_out {
                    continue;
                }
                match (self.arena[u_out].label, self.arena[v_out].label) {
                    (Label::Plus, Label::Plus) => {
                        let d = self.slack(un, vn) / 2.0;
                        if self.arena.root(un) != self.arena.root(vn) {
                            if augment.map_or(true, |(best, _)| d < best) {
                                augment = Some((d, Action::Augment(un, vn)));
                            }
                        } else if shrink.map_or(true, |(best, _)| d < best) {
                            shrink = Some((d, Action::Shrink(un, vn)));
                        }
                    }
                    (Label::Plus, Label::Free) => {
                        let d = self.slack(un, vn);
                        if grow.map_or(true, |(best, _)| d < best) {
                            grow = Some((d, Action::Grow(un, vn)));
                        }
                    }
                    (Label::Free, Label::Plus) => {
                        let d = self.slack(un, vn);
                        if grow.map_or(true, |(best, _)| d < best) {
                            grow = Some((d, Action::Grow(vn, un)));
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut seen = BTreeSet::new();
        for &(_, n) in &self.scan {
            let o = self.arena.outer(n);
            if !seen.insert(o) {
                continue;
            }
            let node = &self.arena[o];
            if node.label == Label::Minus && node.is_blossom() {
                let d = node.dual;
                if expand.map_or(true, |(best, _)| d < best) {
                    expand = Some((d, Action::Expand(o)));
                }
            }
        }

        let delta = [augment, shrink, grow, expand]
            .iter()
            .flatten()
            .map(|&(d, _)| d)
            .fold(f64::INFINITY, f64::min);
        if !delta.is_finite() {
            return None;
        }
        let (_, action) = [augment, shrink, grow, expand]
            .into_iter()
            .flatten()
            .find(|&(d, _)| d <= delta + EPS)?;
        Some((delta, action))
    }

    /// Move every outer node's dual by its label sign times `delta`.
    /// Nested nodes hold still; their effective duals ride along with the
    /// outer blossom.
    fn update_duals(&mut self, delta: f64) {
        let mut seen = BTreeSet::new();
        let outers: Vec<NodeId> = self
            .scan
            .iter()
            .map(|&(_, n)| self.arena.outer(n))
            .filter(|&o| seen.insert(o))
            .collect();
        for o in outers {
            let sign = self.arena[o].label.sign();
            self.arena[o].dual += sign * delta;
        }
    }

    fn collect_pairs(&self) -> PerfectMatching {
        let mut pairs = Vec::with_capacity(self.scan.len() / 2);
        let mut weight = 0.0;
        for &(id, n) in &self.scan {
            let partner = *self
                .matching
                .get(&n)
                .expect("vertex left unmatched after termination");
            let partner_id = self.vertex_of(partner);
            if id < partner_id {
                pairs.push((id, partner_id));
                weight += self.graph.weight(id, partner_id);
            }
        }
        PerfectMatching { pairs, weight }
    }
}
