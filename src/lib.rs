//! Minimum-weight perfect matching on general weighted undirected graphs.
//!
//! The solver is the blossom primal-dual method in its "multiple trees,
//! constant delta" form: a forest of alternating trees grows simultaneously,
//! odd cycles are contracted into blossoms and expanded again as their dual
//! values allow, and every step applies the single smallest dual change that
//! makes one of the four primal operations applicable. Termination yields a
//! perfect matching of minimum total weight, or the verdict that none
//! exists.

pub mod graph;

mod driver;
mod error;
mod forest;
mod node;
mod primal;

pub use driver::{minimum_weight_perfect_matching, PerfectMatching};
pub use error::MatchingError;
pub use graph::{AdjacencyGraph, MatrixGraph, VertexId, WeightedGraph};

// comparison tolerance for slacks and dual values
pub(crate) const EPS: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    use crate::graph::{AdjacencyGraph, MatrixGraph, VertexId, WeightedGraph};
    use crate::{minimum_weight_perfect_matching, MatchingError, PerfectMatching};

    fn solve(edges: &[(VertexId, VertexId, f64)]) -> PerfectMatching {
        let graph = AdjacencyGraph::from_edges(edges);
        minimum_weight_perfect_matching(&graph).expect("expected a perfect matching")
    }

    // minimum perfect-matching weight by exhaustive pairing, None when no
    // perfect matching exists
    fn brute_force<G: WeightedGraph>(graph: &G) -> Option<f64> {
        fn recurse<G: WeightedGraph>(ids: &[VertexId], graph: &G) -> Option<f64> {
            let (&u, rest) = match ids.split_first() {
                Some(split) => split,
                None => return Some(0.0),
            };
            let mut best: Option<f64> = None;
            for (i, &v) in rest.iter().enumerate() {
                if !graph.has_edge(u, v) {
                    continue;
                }
                let mut remaining = rest.to_vec();
                remaining.remove(i);
                if let Some(sub) = recurse(&remaining, graph) {
                    let total = graph.weight(u, v) + sub;
                    best = Some(best.map_or(total, |b: f64| b.min(total)));
                }
            }
            best
        }
        let ids = graph.vertex_ids();
        recurse(&ids, graph)
    }

    // every vertex covered exactly once, every pair an actual edge, weight
    // equal to the sum of the matched weights
    fn check_structure<G: WeightedGraph>(graph: &G, matching: &PerfectMatching) {
        let mut ids = graph.vertex_ids();
        ids.sort_unstable();
        let mut covered = Vec::new();
        let mut total = 0.0;
        for &(a, b) in &matching.pairs {
            assert!(a < b, "pair ({}, {}) not normalised", a, b);
            assert!(graph.has_edge(a, b), "matched pair ({}, {}) off-graph", a, b);
            covered.push(a);
            covered.push(b);
            total += graph.weight(a, b);
        }
        covered.sort_unstable();
        assert_eq!(covered, ids, "matching does not cover every vertex once");
        assert_abs_diff_eq!(total, matching.weight, epsilon = 1e-9);
    }

    #[test]
    fn complete_graph_on_four() {
        let matching = solve(&[
            (0, 1, 1.0),
            (0, 2, 2.0),
            (0, 3, 3.0),
            (1, 2, 3.0),
            (1, 3, 2.0),
            (2, 3, 1.0),
        ]);
        assert_eq!(matching.pairs, vec![(0, 1), (2, 3)]);
        assert_abs_diff_eq!(matching.weight, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn six_cycle_pairs_adjacent_vertices() {
        let matching = solve(&[
            (0, 1, 1.0),
            (1, 2, 1.0),
            (2, 3, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (5, 0, 1.0),
        ]);
        assert_eq!(matching.pairs, vec![(0, 1), (2, 3), (4, 5)]);
        assert_abs_diff_eq!(matching.weight, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn triangle_with_pendant() {
        let matching = solve(&[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (2, 3, 1.0)]);
        assert_eq!(matching.pairs, vec![(0, 1), (2, 3)]);
        assert_abs_diff_eq!(matching.weight, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn two_disjoint_components() {
        let matching = solve(&[(0, 1, 5.0), (2, 3, 7.0)]);
        assert_eq!(matching.pairs, vec![(0, 1), (2, 3)]);
        assert_abs_diff_eq!(matching.weight, 12.0, epsilon = 1e-9);
    }

    // A triangle whose cheap interior edges lure the forest into
    // contracting a blossom that must later be expanded again: the optimum
    // pairs each triangle vertex with its expensive pendant.
    #[test]
    fn blossom_contraction_and_expansion() {
        let matching = solve(&[
            (0, 1, 1.0),
            (1, 2, 1.0),
            (0, 2, 1.0),
            (0, 3, 10.0),
            (1, 4, 10.0),
            (2, 5, 10.0),
            (3, 4, 100.0),
            (3, 5, 100.0),
            (4, 5, 100.0),
        ]);
        assert_eq!(matching.pairs, vec![(0, 3), (1, 4), (2, 5)]);
        assert_abs_diff_eq!(matching.weight, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn odd_vertex_count_is_rejected() {
        let graph = AdjacencyGraph::from_edges_and_vertices(
            &[(0, 1, 1.0), (1, 2, 1.0)],
            &[0, 1, 2, 3, 4],
        );
        assert_eq!(
            minimum_weight_perfect_matching(&graph),
            Err(MatchingError::OddVertexCount(5))
        );
    }

    #[test]
    fn isolated_vertices_are_infeasible() {
        let graph = AdjacencyGraph::from_edges_and_vertices(&[(0, 1, 5.0)], &[0, 1, 2, 3]);
        assert_eq!(
            minimum_weight_perfect_matching(&graph),
            Err(MatchingError::Infeasible)
        );
    }

    #[test]
    fn odd_components_are_infeasible() {
        let graph = AdjacencyGraph::from_edges(&[
            (0, 1, 1.0),
            (1, 2, 1.0),
            (2, 0, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (5, 3, 1.0),
        ]);
        assert_eq!(
            minimum_weight_perfect_matching(&graph),
            Err(MatchingError::Infeasible)
        );
    }

    #[test]
    fn empty_graph_matches_trivially() {
        let graph = AdjacencyGraph::new();
        let matching = minimum_weight_perfect_matching(&graph).unwrap();
        assert!(matching.pairs.is_empty());
        assert_abs_diff_eq!(matching.weight, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_weights_are_taken_at_face_value() {
        let matching = solve(&[
            (1, 2, 2.0),
            (1, 3, -2.0),
            (2, 3, 1.0),
            (2, 4, -1.0),
            (3, 4, -6.0),
        ]);
        assert_eq!(matching.pairs, vec![(1, 2), (3, 4)]);
        assert_abs_diff_eq!(matching.weight, -4.0, epsilon = 1e-9);
    }

    #[test]
    fn vertex_ids_need_not_be_contiguous() {
        let matching = solve(&[
            (5, 10, 1.0),
            (70, 300, 2.0),
            (5, 70, 10.0),
            (10, 300, 10.0),
        ]);
        assert_eq!(matching.pairs, vec![(5, 10), (70, 300)]);
        assert_abs_diff_eq!(matching.weight, 3.0, epsilon = 1e-9);
    }

    fn random_edge_list(
        n: usize,
        density: f64,
        rng: &mut Pcg64,
    ) -> Vec<(VertexId, VertexId, f64)> {
        let mut edges = Vec::new();
        for u in 0..n as VertexId {
            for v in u + 1..n as VertexId {
                if rng.gen_bool(density) {
                    edges.push((u, v, rng.gen_range(1.0..100.0)));
                }
            }
        }
        edges
    }

    // Renaming the vertices permutes the matched pairs and leaves the
    // weight alone. Random real weights make the optimum unique, so the
    // pair sets must correspond exactly.
    #[test]
    fn renaming_vertices_renames_the_matching() {
        let permutation: [VertexId; 10] = [7, 2, 9, 4, 0, 5, 8, 1, 6, 3];
        let mut rng = Pcg64::seed_from_u64(7);
        let mut checked = 0;
        while checked < 50 {
            let edges = random_edge_list(10, 0.8, &mut rng);
            let original =
                AdjacencyGraph::from_edges_and_vertices(&edges, &(0..10).collect::<Vec<_>>());
            let baseline = match minimum_weight_perfect_matching(&original) {
                Ok(matching) => matching,
                Err(_) => continue,
            };
            let renamed_edges: Vec<(VertexId, VertexId, f64)> = edges
                .iter()
                .map(|&(u, v, w)| (permutation[u as usize], permutation[v as usize], w))
                .collect();
            let renamed_graph = AdjacencyGraph::from_edges(&renamed_edges);
            let renamed = minimum_weight_perfect_matching(&renamed_graph).unwrap();

            let mut expected: Vec<(VertexId, VertexId)> = baseline
                .pairs
                .iter()
                .map(|&(a, b)| {
                    let (x, y) = (permutation[a as usize], permutation[b as usize]);
                    (x.min(y), x.max(y))
                })
                .collect();
            expected.sort_unstable();
            assert_eq!(renamed.pairs, expected);
            assert_abs_diff_eq!(renamed.weight, baseline.weight, epsilon = 1e-6);
            checked += 1;
        }
    }

    // Running the matcher on the matching's own edge set must reproduce it.
    #[test]
    fn rerun_on_matched_edges_is_idempotent() {
        let mut rng = Pcg64::seed_from_u64(11);
        let mut checked = 0;
        while checked < 50 {
            let edges = random_edge_list(12, 0.7, &mut rng);
            let graph =
                AdjacencyGraph::from_edges_and_vertices(&edges, &(0..12).collect::<Vec<_>>());
            let matching = match minimum_weight_perfect_matching(&graph) {
                Ok(matching) => matching,
                Err(_) => continue,
            };
            let restricted: Vec<(VertexId, VertexId, f64)> = matching
                .pairs
                .iter()
                .map(|&(a, b)| (a, b, graph.weight(a, b)))
                .collect();
            let rerun = solve(&restricted);
            assert_eq!(rerun.pairs, matching.pairs);
            assert_abs_diff_eq!(rerun.weight, matching.weight, epsilon = 1e-6);
            checked += 1;
        }
    }

    fn stress_instance(n: usize, rng: &mut Pcg64) {
        let density = rng.gen_range(0.3..0.95);
        let mut edges: Vec<(VertexId, VertexId, i64)> = Vec::new();
        for u in 0..n as VertexId {
            for v in u + 1..n as VertexId {
                if rng.gen_bool(density) {
                    edges.push((u, v, rng.gen_range(1..=100)));
                }
            }
        }
        let vertices: Vec<VertexId> = (0..n as VertexId).collect();
        let graph = AdjacencyGraph::from_edges_and_vertices(&edges, &vertices);

        let outcome = minimum_weight_perfect_matching(&graph);
        if n <= 10 {
            match (outcome, brute_force(&graph)) {
                (Ok(matching), Some(optimum)) => {
                    check_structure(&graph, &matching);
                    assert_abs_diff_eq!(matching.weight, optimum, epsilon = 1e-9);
                }
                (Err(MatchingError::Infeasible), None) => {}
                (got, want) => panic!(
                    "solver and brute force disagree on {} vertices: {:?} vs {:?}",
                    n, got, want
                ),
            }
        } else if let Ok(matching) = outcome {
            check_structure(&graph, &matching);
        }
    }

    #[test]
    fn random_small_graphs_match_brute_force() {
        let mut rng = Pcg64::seed_from_u64(20240229);
        for round in 0..1500 {
            let n = 6 + 2 * (round % 3);
            stress_instance(n, &mut rng);
        }
    }

    #[test]
    fn random_medium_graphs_stay_consistent() {
        let mut rng = Pcg64::seed_from_u64(987654321);
        for _ in 0..1500 {
            let n = 2 * rng.gen_range(3..=10);
            stress_instance(n, &mut rng);
        }
    }

    // The full sweep from the acceptance checklist; slow, so opt-in.
    #[test]
    #[ignore]
    fn random_stress_full_sweep() {
        let mut rng = Pcg64::seed_from_u64(1);
        for _ in 0..10_000 {
            let n = 2 * rng.gen_range(3..=10);
            stress_instance(n, &mut rng);
        }
    }

    #[test]
    fn dense_matrix_graphs_solve_too() {
        let mut rng = Pcg64::seed_from_u64(5);
        for _ in 0..100 {
            let graph = MatrixGraph::random(10, 0.9, 100.0, &mut rng);
            match (minimum_weight_perfect_matching(&graph), brute_force(&graph)) {
                (Ok(matching), Some(optimum)) => {
                    check_structure(&graph, &matching);
                    assert_abs_diff_eq!(matching.weight, optimum, epsilon = 1e-6);
                }
                (Err(MatchingError::Infeasible), None) => {}
                (got, want) => panic!("matrix instance disagreement: {:?} vs {:?}", got, want),
            }
        }
    }
}
