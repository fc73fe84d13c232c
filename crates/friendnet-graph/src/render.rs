use crate::community::{CommunityAssignment, UNASSIGNED};
use crate::graph::FriendGraph;
use crate::layout::{NodePositions, Position};
use crate::scores::{top_scoring, NodeScores};
use friendnet_core::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Number of colour classes used when colouring by score.
pub const SCORE_CLASSES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub position: Position,
    /// Text drawn next to the node; most nodes carry none
    pub label: Option<String>,
    pub color_class: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub source: Position,
    pub target: Position,
}

/// Everything a front end needs to draw the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

/// How nodes are coloured and which ones get a label.
///
/// With `scores`, the best-scoring `label_proportion` of nodes are labelled and
/// colour follows score. Otherwise each node is labelled with probability
/// `label_proportion` (drawn from a generator seeded with `seed`) and colour
/// follows `communities` when given.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions<'a> {
    pub scores: Option<&'a NodeScores>,
    pub communities: Option<&'a CommunityAssignment>,
    pub label_proportion: f64,
    pub seed: u64,
}

impl RenderPayload {
    /// Projects graph and positions into a payload. Neither input is modified.
    pub fn build(graph: &FriendGraph, positions: &NodePositions, options: &RenderOptions<'_>) -> Self {
        let labelled = labelled_nodes(graph, options);
        let score_range = options.scores.map(score_range);

        let nodes: Vec<RenderNode> = graph
            .nodes()
            .iter()
            .filter_map(|node| {
                let Some(position) = positions.get(&node.id) else {
                    debug!("Node {} has no position and is not rendered", node.id);
                    return None;
                };
                let score = options.scores.and_then(|s| s.get(&node.id).copied());
                let color_class = match (score, score_range) {
                    (Some(score), Some(range)) => score_class(score, range),
                    _ => options
                        .communities
                        .and_then(|c| c.get(&node.id).copied())
                        .unwrap_or(UNASSIGNED),
                };
                Some(RenderNode {
                    id: node.id.clone(),
                    position: *position,
                    label: labelled
                        .contains(node.id.as_str())
                        .then(|| node.name.clone())
                        .flatten(),
                    color_class,
                    score,
                })
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                Some(RenderEdge {
                    source: *positions.get(&edge.source)?,
                    target: *positions.get(&edge.target)?,
                })
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            "Wrote render payload with {} nodes and {} edges to {}",
            self.nodes.len(),
            self.edges.len(),
            path.display()
        );
        Ok(())
    }
}

fn labelled_nodes<'g>(graph: &'g FriendGraph, options: &RenderOptions<'_>) -> HashSet<&'g str> {
    // A non-finite proportion labels nothing.
    let proportion = if options.label_proportion.is_finite() {
        options.label_proportion.clamp(0.0, 1.0)
    } else {
        0.0
    };

    if let Some(scores) = options.scores {
        let top = top_scoring(scores, proportion);
        return graph
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .filter(|id| top.contains(id))
            .collect();
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    graph
        .nodes()
        .iter()
        .filter(|_| rng.random_bool(proportion))
        .map(|node| node.id.as_str())
        .collect()
}

fn score_range(scores: &NodeScores) -> (f64, f64) {
    scores
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)))
}

fn score_class(score: f64, (lo, hi): (f64, f64)) -> usize {
    if hi <= lo {
        return 0;
    }
    let normalized = (score - lo) / (hi - lo);
    ((normalized * SCORE_CLASSES as f64) as usize).min(SCORE_CLASSES - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SpringLayout;

    fn triangle_with_tail() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id, Some(id.to_uppercase()));
        }
        for (u, v) in [("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")] {
            graph.add_edge(u, v);
        }
        graph
    }

    #[test]
    fn test_payload_matches_positions_without_touching_them() {
        let graph = triangle_with_tail();
        let positions = SpringLayout::default().compute(&graph, 0);
        let before = positions.clone();

        let payload = RenderPayload::build(&graph, &positions, &RenderOptions::default());

        assert_eq!(positions, before);
        assert_eq!(payload.nodes.len(), 4);
        assert_eq!(payload.edges.len(), 4);
        assert_eq!(payload.nodes[0].position, positions["a"]);
        assert_eq!(payload.edges[3].source, positions["c"]);
        assert_eq!(payload.edges[3].target, positions["d"]);
        assert!(payload.nodes.iter().all(|n| n.label.is_none()));
        assert!(payload.nodes.iter().all(|n| n.color_class == UNASSIGNED));
    }

    #[test]
    fn test_scores_drive_labels_and_colours() {
        let graph = triangle_with_tail();
        let positions = SpringLayout::default().compute(&graph, 0);
        let scores: NodeScores = [("a", 0.1), ("b", 0.1), ("c", 0.9), ("d", 0.0)]
            .into_iter()
            .map(|(id, s)| (id.to_string(), s))
            .collect();

        let payload = RenderPayload::build(
            &graph,
            &positions,
            &RenderOptions {
                scores: Some(&scores),
                label_proportion: 0.25,
                ..Default::default()
            },
        );

        let labels: Vec<_> = payload.nodes.iter().map(|n| n.label.as_deref()).collect();
        assert_eq!(labels, vec![None, None, Some("C"), None]);
        assert_eq!(payload.nodes[2].color_class, SCORE_CLASSES - 1);
        assert_eq!(payload.nodes[3].color_class, 0);
    }

    #[test]
    fn test_communities_colour_and_full_labelling() {
        let graph = triangle_with_tail();
        let positions = SpringLayout::default().compute(&graph, 0);
        let communities: CommunityAssignment = [("a", 1), ("b", 1), ("c", 2), ("d", 0)]
            .into_iter()
            .map(|(id, c)| (id.to_string(), c))
            .collect();

        let payload = RenderPayload::build(
            &graph,
            &positions,
            &RenderOptions {
                communities: Some(&communities),
                label_proportion: 1.0,
                ..Default::default()
            },
        );

        let classes: Vec<_> = payload.nodes.iter().map(|n| n.color_class).collect();
        assert_eq!(classes, vec![1, 1, 2, 0]);
        assert!(payload.nodes.iter().all(|n| n.label.is_some()));
    }

    #[test]
    fn test_non_finite_label_proportion_labels_nothing() {
        let graph = triangle_with_tail();
        let positions = SpringLayout::default().compute(&graph, 0);
        let scores = crate::scores::degree_centrality(&graph);

        for proportion in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let sampled = RenderPayload::build(
                &graph,
                &positions,
                &RenderOptions {
                    label_proportion: proportion,
                    ..Default::default()
                },
            );
            assert!(sampled.nodes.iter().all(|n| n.label.is_none()));

            let scored = RenderPayload::build(
                &graph,
                &positions,
                &RenderOptions {
                    scores: Some(&scores),
                    label_proportion: proportion,
                    ..Default::default()
                },
            );
            assert!(scored.nodes.iter().all(|n| n.label.is_none()));
        }
    }
}
