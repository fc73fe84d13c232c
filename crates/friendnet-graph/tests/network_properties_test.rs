use friendnet_core::{Identity, ScanDataset};
use friendnet_graph::{
    build_graph, CommunityDetector, FriendNetwork, LabelPropagation, RenderOptions, UNASSIGNED,
};
use tempfile::TempDir;

fn person(id: &str) -> Identity {
    Identity::new(id, format!("Person {id}"), format!("https://www.facebook.com/{id}"))
}

/// Two components: a five-node ring and a pair.
fn ring_and_pair() -> ScanDataset {
    let ids = ["r1", "r2", "r3", "r4", "r5", "p1", "p2"];
    let mut dataset = ScanDataset::new(ids.iter().map(|id| person(id)).collect());
    dataset.record_mutual_friends("r1", vec![person("r2"), person("r5")].into());
    dataset.record_mutual_friends("r3", vec![person("r2"), person("r4")].into());
    dataset.record_mutual_friends("r4", vec![person("r5")].into());
    dataset.record_mutual_friends("p1", vec![person("p2")].into());
    dataset
}

#[test]
fn test_graph_from_mutual_friend_lists() {
    let mut dataset = ScanDataset::new(vec![person("A"), person("B"), person("C")].into());
    dataset.record_mutual_friends("A", vec![person("B")].into());
    dataset.record_mutual_friends("C", vec![person("B"), person("Stranger")].into());

    let graph = build_graph(&dataset);

    let nodes: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, vec!["A", "B", "C"]);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.has_edge("A", "B"));
    assert!(graph.has_edge("C", "B"));
}

#[test]
fn test_biggest_component_is_the_five_node_ring() {
    let mut network = FriendNetwork::from_dataset(ring_and_pair());
    assert_eq!(network.graph().connected_components().len(), 2);

    let removed = network.filter_biggest_component();

    assert_eq!(removed, 2);
    let mut kept: Vec<&str> = network.graph().nodes().iter().map(|n| n.id.as_str()).collect();
    kept.sort();
    assert_eq!(kept, vec!["r1", "r2", "r3", "r4", "r5"]);
    assert_eq!(network.graph().edge_count(), 5);
    assert_eq!(network.positions().len(), 5);
}

#[test]
fn test_layout_is_reproducible_for_a_seed() {
    let mut network = FriendNetwork::from_dataset(ring_and_pair());
    let first = network.compute_positions(0).clone();
    let second = network.compute_positions(0).clone();
    assert_eq!(first, second);

    let other = network.compute_positions(99).clone();
    assert_ne!(first, other);
}

#[test]
fn test_detected_communities_cover_all_nodes() {
    let network = FriendNetwork::from_dataset(ring_and_pair());
    let detector = LabelPropagation::new(0, 20);

    let assignment = network.detect_communities(&detector);
    assert_eq!(assignment.len(), network.graph().node_count());
    assert!(assignment.values().all(|&c| c != UNASSIGNED));
    assert_eq!(assignment["p1"], assignment["p2"]);
    assert_ne!(assignment["p1"], assignment["r1"]);

    let partial = network.community_assignment(&[vec!["r1".to_string()]]);
    assert_eq!(partial.len(), 7);
    assert_eq!(partial["r1"], 1);
    assert_eq!(partial["p2"], UNASSIGNED);

    assert!(detector.detect(network.graph()).len() >= 2);
}

#[test]
fn test_saved_dataset_analyses_to_render_payload() {
    let dir = TempDir::new().unwrap();
    let dataset_path = dir.path().join("network.json");
    let payload_path = dir.path().join("payload.json");
    ring_and_pair().save(&dataset_path).unwrap();

    let network = FriendNetwork::load(&dataset_path).unwrap();
    assert_eq!(network.dataset(), &ring_and_pair());

    let scores = network.pagerank();
    let payload = network.render(&RenderOptions {
        scores: Some(&scores),
        label_proportion: 0.1,
        ..Default::default()
    });
    payload.save(&payload_path).unwrap();

    assert_eq!(payload.nodes.len(), 7);
    assert_eq!(payload.edges.len(), 6);
    assert!(payload.nodes.iter().any(|n| n.label.is_some()));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&payload_path).unwrap()).unwrap();
    assert_eq!(written["nodes"].as_array().unwrap().len(), 7);
}

#[test]
fn test_equal_components_keep_the_first_found() {
    let mut dataset = ScanDataset::new(vec![person("z1"), person("z2"), person("a1"), person("a2")].into());
    dataset.record_mutual_friends("a1", vec![person("a2")].into());
    dataset.record_mutual_friends("z1", vec![person("z2")].into());
    let mut network = FriendNetwork::from_dataset(dataset);

    assert_eq!(network.filter_biggest_component(), 2);

    let kept: Vec<&str> = network.graph().nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(kept, vec!["z1", "z2"]);
}
