use std::collections::{HashMap, HashSet, VecDeque};

/// A friend of the scanned account, keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub name: Option<String>,
}

/// Undirected edge. `source < target` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    fn normalized(a: &str, b: &str) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Undirected simple graph over friend ids.
///
/// Nodes and edges keep insertion order so that every derived result
/// (components, layouts, communities) is reproducible.
#[derive(Debug, Clone, Default)]
pub struct FriendGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    id_to_index: HashMap<String, usize>,
    edge_set: HashSet<GraphEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl FriendGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Returns `false` if the id is already present.
    pub fn add_node(&mut self, id: impl Into<String>, name: Option<String>) -> bool {
        let id = id.into();
        if self.id_to_index.contains_key(&id) {
            return false;
        }
        self.id_to_index.insert(id.clone(), self.nodes.len());
        self.nodes.push(GraphNode { id, name });
        self.adjacency.push(Vec::new());
        true
    }

    /// Adds an undirected edge between two existing nodes.
    ///
    /// Self-loops, unknown endpoints and duplicates (in either direction) are
    /// rejected with `false`.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let (Some(ia), Some(ib)) = (self.node_index(a), self.node_index(b)) else {
            return false;
        };
        let edge = GraphEdge::normalized(a, b);
        if !self.edge_set.insert(edge.clone()) {
            return false;
        }
        self.edges.push(edge);
        self.adjacency[ia].push(ib);
        self.adjacency[ib].push(ia);
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge_set.contains(&GraphEdge::normalized(a, b))
    }

    /// Neighbour ids in the order their edges were added.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.node_index(id)
            .map(|i| {
                self.adjacency[i]
                    .iter()
                    .map(|&j| self.nodes[j].id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn neighbor_indices(&self, index: usize) -> &[usize] {
        &self.adjacency[index]
    }

    pub fn degree(&self, id: &str) -> usize {
        self.node_index(id).map_or(0, |i| self.adjacency[i].len())
    }

    /// Connected components as lists of node ids.
    ///
    /// Components are discovered by breadth-first search starting from nodes in
    /// insertion order, so the first component contains the first node.
    pub fn connected_components(&self) -> Vec<Vec<&str>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                component.push(self.nodes[current].id.as_str());
                for &next in &self.adjacency[current] {
                    if !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Induced subgraph on `keep`, preserving node and edge order.
    pub fn subgraph(&self, keep: &HashSet<&str>) -> FriendGraph {
        let mut sub = FriendGraph::new();
        for node in self.nodes.iter().filter(|n| keep.contains(n.id.as_str())) {
            sub.add_node(node.id.clone(), node.name.clone());
        }
        for edge in &self.edges {
            sub.add_edge(&edge.source, &edge.target);
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ids: &[&str]) -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in ids {
            graph.add_node(*id, None);
        }
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1]);
        }
        graph
    }

    #[test]
    fn test_rejects_duplicates_and_self_loops() {
        let mut graph = path(&["a", "b"]);
        assert!(!graph.add_node("a", Some("again".to_string())));
        assert!(!graph.add_edge("b", "a"));
        assert!(!graph.add_edge("a", "a"));
        assert!(!graph.add_edge("a", "missing"));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("b", "a"));
    }

    #[test]
    fn test_components_follow_insertion_order() {
        let mut graph = path(&["a", "b", "c"]);
        graph.add_node("x", None);
        graph.add_node("y", None);
        graph.add_edge("x", "y");
        graph.add_node("lonely", None);

        let components = graph.connected_components();
        assert_eq!(components, vec![vec!["a", "b", "c"], vec!["x", "y"], vec!["lonely"]]);
    }

    #[test]
    fn test_subgraph_keeps_only_internal_edges() {
        let graph = path(&["a", "b", "c", "d"]);
        let keep: HashSet<&str> = ["b", "c", "d"].into_iter().collect();
        let sub = graph.subgraph(&keep);

        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert!(!sub.contains_node("a"));
        assert_eq!(sub.neighbors("b"), vec!["c"]);
    }
}
