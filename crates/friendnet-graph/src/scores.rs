use crate::graph::FriendGraph;
use std::collections::{BTreeMap, HashSet};

pub type NodeScores = BTreeMap<String, f64>;

pub const PAGERANK_DAMPING: f64 = 0.85;
pub const PAGERANK_ITERATIONS: usize = 100;

/// Fraction of the other nodes each node is connected to.
pub fn degree_centrality(graph: &FriendGraph) -> NodeScores {
    let n = graph.node_count();
    if n <= 1 {
        return graph.nodes().iter().map(|node| (node.id.clone(), 1.0)).collect();
    }
    let scale = 1.0 / (n - 1) as f64;
    graph
        .nodes()
        .iter()
        .map(|node| (node.id.clone(), graph.degree(&node.id) as f64 * scale))
        .collect()
}

/// Power-iteration PageRank. Isolated nodes spread their score evenly.
pub fn pagerank(graph: &FriendGraph, iterations: usize, damping: f64) -> NodeScores {
    let n = graph.node_count();
    if n == 0 {
        return NodeScores::new();
    }

    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..iterations {
        let mut next = vec![(1.0 - damping) / n as f64; n];

        for (i, score) in scores.iter().enumerate() {
            let neighbours = graph.neighbor_indices(i);
            if neighbours.is_empty() {
                let share = score * damping / n as f64;
                for s in next.iter_mut() {
                    *s += share;
                }
            } else {
                let share = score * damping / neighbours.len() as f64;
                for &j in neighbours {
                    next[j] += share;
                }
            }
        }
        scores = next;
    }

    graph
        .nodes()
        .iter()
        .zip(scores)
        .map(|(node, score)| (node.id.clone(), score))
        .collect()
}

/// Ids whose score reaches the `1 - proportion` quantile (linear
/// interpolation between closest ranks).
pub fn top_scoring(scores: &NodeScores, proportion: f64) -> HashSet<&str> {
    if scores.is_empty() || proportion <= 0.0 {
        return HashSet::new();
    }

    let mut sorted: Vec<f64> = scores.values().copied().collect();
    sorted.sort_by(f64::total_cmp);

    let rank = (1.0 - proportion.min(1.0)) * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    let threshold = sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64);

    scores
        .iter()
        .filter(|(_, score)| **score >= threshold)
        .map(|(id, _)| id.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn star() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in ["hub", "a", "b", "c"] {
            graph.add_node(id, None);
        }
        for leaf in ["a", "b", "c"] {
            graph.add_edge("hub", leaf);
        }
        graph
    }

    #[test]
    fn test_degree_centrality() {
        let scores = degree_centrality(&star());
        assert_relative_eq!(scores["hub"], 1.0);
        assert_relative_eq!(scores["a"], 1.0 / 3.0);
    }

    #[test]
    fn test_pagerank_sums_to_one_and_favours_hub() {
        let scores = pagerank(&star(), PAGERANK_ITERATIONS, PAGERANK_DAMPING);
        let total: f64 = scores.values().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert!(scores["hub"] > scores["a"]);
        assert_relative_eq!(scores["a"], scores["b"], epsilon = 1e-12);
    }

    #[test]
    fn test_top_scoring_keeps_requested_share() {
        let scores: NodeScores = (0..10).map(|i| (format!("n{i}"), i as f64)).collect();

        let top = top_scoring(&scores, 0.2);
        assert_eq!(top.len(), 2);
        assert!(top.contains("n9") && top.contains("n8"));

        assert!(top_scoring(&scores, 0.0).is_empty());
        assert_eq!(top_scoring(&scores, 1.0).len(), 10);
    }
}
