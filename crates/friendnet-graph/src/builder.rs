use crate::graph::FriendGraph;
use friendnet_core::ScanDataset;
use std::collections::HashMap;
use tracing::debug;

/// Builds the friendship graph of a dataset.
///
/// Every friend with an id becomes a node named after the friend. Each
/// `(owner, mutual friend)` pair becomes an edge once the mutual friend's link
/// is found in the friend list. Pairs whose link matches no friend, and owners
/// that are not friends themselves, are dropped.
pub fn build_graph(dataset: &ScanDataset) -> FriendGraph {
    let mut graph = FriendGraph::new();
    let mut ids_by_link: HashMap<&str, &str> = HashMap::new();

    for friend in dataset.friends.iter() {
        let Some(id) = friend.id.as_deref() else {
            debug!("Friend {} has no id and gets no node", friend);
            continue;
        };
        graph.add_node(id, friend.name.clone());
        if let Some(link) = friend.link.as_deref() {
            ids_by_link.entry(link).or_insert(id);
        }
    }

    let mut dropped = 0usize;
    for (owner_id, mutual_friend) in dataset.mutual_pairs() {
        if !graph.contains_node(owner_id) {
            dropped += 1;
            continue;
        }
        let counterpart = mutual_friend
            .link
            .as_deref()
            .and_then(|link| ids_by_link.get(link).copied());
        match counterpart {
            Some(counterpart_id) => {
                graph.add_edge(owner_id, counterpart_id);
            }
            None => dropped += 1,
        }
    }

    debug!(
        "Built graph with {} nodes and {} edges ({} mutual friend records without a counterpart)",
        graph.node_count(),
        graph.edge_count(),
        dropped
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use friendnet_core::Identity;

    fn friend(id: &str) -> Identity {
        Identity::new(id, id.to_uppercase(), format!("https://www.facebook.com/{id}"))
    }

    #[test]
    fn test_edges_follow_link_matches() {
        let mut dataset = ScanDataset::new(vec![friend("a"), friend("b"), friend("c")].into());
        dataset.record_mutual_friends("a", vec![friend("b")].into());
        dataset.record_mutual_friends("c", vec![friend("b")].into());

        let graph = build_graph(&dataset);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge("a", "b"));
        assert!(graph.has_edge("c", "b"));
        assert!(!graph.has_edge("a", "c"));
        assert_eq!(graph.node("a").unwrap().name.as_deref(), Some("A"));
    }

    #[test]
    fn test_reciprocal_records_collapse_to_one_edge() {
        let mut dataset = ScanDataset::new(vec![friend("a"), friend("b")].into());
        dataset.record_mutual_friends("a", vec![friend("b")].into());
        dataset.record_mutual_friends("b", vec![friend("a")].into());

        assert_eq!(build_graph(&dataset).edge_count(), 1);
    }

    #[test]
    fn test_unknown_mutual_friend_and_owner_are_dropped() {
        let mut dataset = ScanDataset::new(vec![friend("a"), friend("b")].into());
        dataset.record_mutual_friends("a", vec![friend("z"), Identity::default()].into());
        dataset.record_mutual_friends("ghost", vec![friend("b")].into());

        let graph = build_graph(&dataset);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }
}
