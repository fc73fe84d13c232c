use crate::graph::FriendGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};

/// Disjoint groups of node ids.
pub type Partition = Vec<Vec<String>>;

/// Node id to community index. Indices start at 1; 0 means unassigned.
pub type CommunityAssignment = BTreeMap<String, usize>;

pub const UNASSIGNED: usize = 0;

/// Pluggable clustering algorithm.
pub trait CommunityDetector {
    fn name(&self) -> &'static str;

    fn detect(&self, graph: &FriendGraph) -> Partition;
}

/// Projects a partition onto the nodes of `graph`.
///
/// The i-th subset gets index `i + 1`. Every node of the graph is present in
/// the result; nodes missing from all subsets map to [`UNASSIGNED`]. Ids that
/// are not graph nodes are ignored. If subsets overlap, the later one wins.
pub fn community_assignment(graph: &FriendGraph, partition: &[Vec<String>]) -> CommunityAssignment {
    let mut assignment: CommunityAssignment = graph
        .nodes()
        .iter()
        .map(|node| (node.id.clone(), UNASSIGNED))
        .collect();

    for (index, community) in partition.iter().enumerate() {
        for id in community {
            if let Some(slot) = assignment.get_mut(id) {
                *slot = index + 1;
            }
        }
    }
    assignment
}

/// Seeded asynchronous label propagation.
///
/// Each round visits nodes in an order shuffled by the seeded generator and
/// moves every node to the label most common among its neighbours, keeping
/// its own label when that is among the most common and otherwise taking the
/// smallest. Stops when a round changes nothing or after `max_iterations`.
/// Communities are returned largest first.
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    pub seed: u64,
    pub max_iterations: usize,
}

impl LabelPropagation {
    pub fn new(seed: u64, max_iterations: usize) -> Self {
        Self { seed, max_iterations }
    }
}

impl CommunityDetector for LabelPropagation {
    fn name(&self) -> &'static str {
        "label-propagation"
    }

    fn detect(&self, graph: &FriendGraph) -> Partition {
        let n = graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);

        for _ in 0..self.max_iterations {
            order.shuffle(&mut rng);
            let mut changed = false;

            for &node in &order {
                let neighbours = graph.neighbor_indices(node);
                if neighbours.is_empty() {
                    continue;
                }
                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for &neighbour in neighbours {
                    *counts.entry(labels[neighbour]).or_default() += 1;
                }
                let best = counts.values().copied().max().unwrap_or(0);
                if counts.get(&labels[node]) == Some(&best) {
                    continue;
                }
                if let Some((&label, _)) = counts.iter().find(|(_, count)| **count == best) {
                    labels[node] = label;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut partition: Partition = Vec::new();
        for (index, node) in graph.nodes().iter().enumerate() {
            let slot = *slots.entry(labels[index]).or_insert_with(|| {
                partition.push(Vec::new());
                partition.len() - 1
            });
            partition[slot].push(node.id.clone());
        }
        partition.sort_by(|a, b| b.len().cmp(&a.len()));
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in ["a", "b", "c", "x", "y", "z"] {
            graph.add_node(id, None);
        }
        for (u, v) in [("a", "b"), ("b", "c"), ("c", "a"), ("x", "y"), ("y", "z"), ("z", "x")] {
            graph.add_edge(u, v);
        }
        graph
    }

    #[test]
    fn test_assignment_covers_every_node() {
        let graph = two_triangles();
        let partition = vec![vec!["a".to_string(), "b".to_string()], vec!["x".to_string(), "nobody".to_string()]];

        let assignment = community_assignment(&graph, &partition);

        assert_eq!(assignment.len(), graph.node_count());
        assert_eq!(assignment["a"], 1);
        assert_eq!(assignment["b"], 1);
        assert_eq!(assignment["x"], 2);
        assert_eq!(assignment["c"], UNASSIGNED);
        assert!(!assignment.contains_key("nobody"));
    }

    #[test]
    fn test_label_propagation_separates_disconnected_triangles() {
        let graph = two_triangles();
        let partition = LabelPropagation::new(0, 20).detect(&graph);

        assert_eq!(partition.len(), 2);
        let assignment = community_assignment(&graph, &partition);
        assert_eq!(assignment["a"], assignment["b"]);
        assert_eq!(assignment["b"], assignment["c"]);
        assert_eq!(assignment["x"], assignment["z"]);
        assert_ne!(assignment["a"], assignment["x"]);
    }

    #[test]
    fn test_label_propagation_is_reproducible() {
        let graph = two_triangles();
        let detector = LabelPropagation::new(42, 20);
        assert_eq!(detector.detect(&graph), detector.detect(&graph));
    }
}
