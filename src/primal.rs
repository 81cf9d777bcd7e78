use log::debug;

use crate::forest::Forest;
use crate::graph::WeightedGraph;
use crate::node::{Label, NodeId};

impl<'a, G: WeightedGraph> Forest<'a, G> {
    /// Extend a tree across the tight edge `(u, v)`: `u` lies in an outer
    /// `Plus` node, `v` in a free node. The free node joins the tree as a
    /// `Minus` child and drags its matched partner in as a `Plus`
    /// grandchild, so alternation is preserved.
    pub fn grow(&mut self, u: NodeId, v: NodeId) {
        debug!("grow {} -> {}", self.vertex_of(u), self.vertex_of(v));
        let u_out = self.arena.outer(u);
        let v_out = self.arena.outer(v);
        let (inner, partner) = self
            .tight_with(v_out)
            .expect("free node without a matched partner");
        let partner_out = self.arena.outer(partner);

        self.arena[u_out].children.push(v);
        self.arena[v_out].parent = Some(u);
        self.arena[v_out].label = Label::Minus;

        self.arena[v_out].children = vec![partner];
        self.arena[partner_out].parent = Some(inner);
        self.arena[partner_out].label = Label::Plus;
    }

    /// Flip the matching along the augmenting path joining the roots of two
    /// different trees through the tight edge `(u, v)`, then dissolve both
    /// trees into matched free nodes.
    pub fn augment(&mut self, u: NodeId, v: NodeId) {
        debug!("augment {} -- {}", self.vertex_of(u), self.vertex_of(v));
        for l in [u, v] {
            let pairs = self.arena.ancestors_with_edges(l);
            let root = self.arena.root(l);
            // Climbing from the endpoint, tree edges alternate matched,
            // unmatched, matched, ... Drop the matched ones first so no
            // stale pair survives the rebuild below.
            for (i, &(c, _)) in pairs.iter().enumerate() {
                if i % 2 == 0 {
                    self.unmatch(c);
                }
            }
            for (i, &(c, p)) in pairs.iter().enumerate() {
                if i % 2 == 1 {
                    self.set_tight(c, p, None);
                }
            }
            for d in self.arena.descendants(root) {
                self.free(d);
            }
        }
        self.set_tight(u, v, None);
    }

    /// Contract the odd cycle closed by the tight edge `(u, v)`, whose
    /// outer nodes are `Plus` members of the same tree, into a fresh
    /// blossom that takes the lowest common ancestor's place.
    pub fn shrink(&mut self, u: NodeId, v: NodeId) {
        let ancestors_u = self.arena.ancestors(u);
        let ancestors_v = self.arena.ancestors(v);
        let mut meet = None;
        'search: for (i, &a) in ancestors_u.iter().enumerate() {
            for (j, &b) in ancestors_v.iter().enumerate() {
                if a == b {
                    meet = Some((i, j));
                    break 'search;
                }
            }
        }
        let (ci, cj) = meet.expect("shrink endpoints lie in different trees");
        let lca = ancestors_u[ci];

        // Directed cycle: down from the common ancestor to u, across the
        // new tight edge, back up from v.
        let edges_u = self.arena.ancestors_with_edges(u);
        let edges_v = self.arena.ancestors_with_edges(v);
        let mut cycle = Vec::with_capacity(ci + cj + 1);
        for k in (0..ci).rev() {
            let (c, p) = edges_u[k];
            cycle.push((p, c));
        }
        cycle.push((u, v));
        for k in 0..cj {
            let (c, p) = edges_v[k];
            cycle.push((c, p));
        }
        debug!(
            "shrink {} -- {}: cycle of {}",
            self.vertex_of(u),
            self.vertex_of(v),
            cycle.len()
        );

        let b = self.arena.new_blossom(cycle);
        self.arena[b].parent = self.arena[lca].parent;

        let members: Vec<NodeId> = {
            let cycle = self.arena[b].cycle.clone();
            cycle
                .iter()
                .map(|&(s, _)| self.arena.blossom_within(s, b))
                .collect()
        };
        // Children of the cycle members that point outside the cycle now
        // hang off the blossom; links onto the cycle itself project to `b`
        // and disappear.
        let mut outside = Vec::new();
        for &m in &members {
            for &c in &self.arena[m].children {
                if self.arena.outer(c) != b {
                    outside.push(c);
                }
            }
        }
        self.arena[b].children = outside;
        for &m in &members {
            self.arena[m].parent = None;
            self.arena[m].children.clear();
            self.arena[m].label = Label::Free;
        }
        if self.roots.remove(&lca) {
            self.roots.insert(b);
        }
    }

    /// Dissolve an outer `Minus` blossom whose dual reached zero. An
    /// even-length arc of its cycle takes over the blossom's place in the
    /// tree; the remaining arc leaves the forest and is matched pairwise.
    pub fn expand(&mut self, b: NodeId) {
        let p_atom = self.arena[b].parent.expect("expanding a blossom without a parent");
        let parent_out = self.arena.outer(p_atom);
        let entry = self.arena[parent_out]
            .children
            .iter()
            .copied()
            .find(|&c| self.arena.outer(c) == b)
            .expect("no tree edge from the parent into the blossom");
        assert_eq!(
            self.arena[b].children.len(),
            1,
            "minus blossom must have exactly one tree child"
        );
        let down = self.arena[b].children[0];
        let child_out = self.arena.outer(down);
        let base = self.arena[child_out].parent.expect("tree child without a parent link");

        let mut cycle = self.arena[b].cycle.clone();
        let mut subs: Vec<NodeId> = cycle
            .iter()
            .map(|&(s, _)| self.arena.blossom_within(s, b))
            .collect();
        let k = cycle.len();
        debug!("expand blossom of {} sub-blossoms", k);

        let p_sub = self.arena.blossom_within(entry, b);
        let c_sub = self.arena.blossom_within(base, b);
        let start = subs
            .iter()
            .position(|&s| s == p_sub)
            .expect("parent-side sub-blossom missing from the cycle");
        cycle.rotate_left(start);
        subs.rotate_left(start);

        let mut ic = subs
            .iter()
            .position(|&s| s == c_sub)
            .expect("child-side sub-blossom missing from the cycle");
        if ic % 2 == 1 {
            // Walk the cycle the other way round so the tree arc between
            // the parent-side and child-side sub-blossoms has even length.
            let reversed: Vec<(NodeId, NodeId)> = (0..k)
                .map(|j| {
                    let (s, t) = cycle[k - 1 - j];
                    (t, s)
                })
                .collect();
            let resubbed: Vec<NodeId> = (0..k)
                .map(|j| if j == 0 { subs[0] } else { subs[k - j] })
                .collect();
            cycle = reversed;
            subs = resubbed;
            ic = k - ic;
        }

        self.arena.dissolve(b);

        // Rebuild the arc inside the tree, alternating from Minus at the
        // parent attachment down to Minus at the child attachment.
        for j in 0..=ic {
            let s = subs[j];
            self.arena[s].label = if j % 2 == 0 { Label::Minus } else { Label::Plus };
            self.arena[s].parent = Some(if j == 0 { p_atom } else { cycle[j - 1].0 });
            self.arena[s].children = if j == ic { vec![down] } else { vec![cycle[j].1] };
        }
        // Matched edges along the arc sit below each Minus position.
        for j in (0..ic).step_by(2) {
            let (s, t) = cycle[j];
            self.set_tight(s, t, None);
        }

        // The other arc has even length; it leaves the forest and pairs up
        // along its own cycle edges.
        for j in ic + 1..k {
            let sub = subs[j];
            self.free(sub);
        }
        let mut j = ic + 1;
        while j + 1 < k {
            let (s, t) = cycle[j];
            self.set_tight(s, t, None);
            j += 2;
        }
    }
}
