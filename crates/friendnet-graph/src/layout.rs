use crate::graph::FriendGraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_DISTANCE: f64 = 0.01;
const INITIAL_TEMPERATURE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

pub type NodePositions = BTreeMap<String, Position>;

/// Fruchterman-Reingold force-directed layout.
///
/// Starting positions come from a `StdRng` seeded with the caller's seed and
/// every step runs in node/edge insertion order, so a given topology and seed
/// always produce the same coordinates. Output is centred on the origin and
/// scaled so the largest absolute coordinate equals `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringLayout {
    pub iterations: usize,
    pub scale: f64,
}

impl Default for SpringLayout {
    fn default() -> Self {
        Self {
            iterations: 50,
            scale: 1.0,
        }
    }
}

impl SpringLayout {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    pub fn compute(&self, graph: &FriendGraph, seed: u64) -> NodePositions {
        let n = graph.node_count();
        match n {
            0 => return NodePositions::new(),
            1 => {
                return graph
                    .nodes()
                    .iter()
                    .map(|node| (node.id.clone(), Position::default()))
                    .collect()
            }
            _ => {}
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut pos: Vec<[f64; 2]> = (0..n)
            .map(|_| [rng.random::<f64>(), rng.random::<f64>()])
            .collect();

        let edges: Vec<(usize, usize)> = graph
            .edges()
            .iter()
            .filter_map(|e| Some((graph.node_index(&e.source)?, graph.node_index(&e.target)?)))
            .collect();

        let k = (1.0 / n as f64).sqrt();
        let mut temperature = INITIAL_TEMPERATURE;
        let cooling = INITIAL_TEMPERATURE / (self.iterations as f64 + 1.0);

        for _ in 0..self.iterations {
            let mut displacement = vec![[0.0f64; 2]; n];

            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dx = pos[i][0] - pos[j][0];
                    let dy = pos[i][1] - pos[j][1];
                    let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    let repulsion = k * k / distance;
                    displacement[i][0] += dx / distance * repulsion;
                    displacement[i][1] += dy / distance * repulsion;
                }
            }

            for &(a, b) in &edges {
                let dx = pos[a][0] - pos[b][0];
                let dy = pos[a][1] - pos[b][1];
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let attraction = distance * distance / k;
                let (fx, fy) = (dx / distance * attraction, dy / distance * attraction);
                displacement[a][0] -= fx;
                displacement[a][1] -= fy;
                displacement[b][0] += fx;
                displacement[b][1] += fy;
            }

            for (p, d) in pos.iter_mut().zip(&displacement) {
                let length = (d[0] * d[0] + d[1] * d[1]).sqrt().max(MIN_DISTANCE);
                let step = length.min(temperature);
                p[0] += d[0] / length * step;
                p[1] += d[1] / length * step;
            }
            temperature -= cooling;
        }

        self.rescale(&mut pos);
        graph
            .nodes()
            .iter()
            .zip(pos)
            .map(|(node, [x, y])| (node.id.clone(), Position { x, y }))
            .collect()
    }

    fn rescale(&self, pos: &mut [[f64; 2]]) {
        let n = pos.len() as f64;
        let mean_x = pos.iter().map(|p| p[0]).sum::<f64>() / n;
        let mean_y = pos.iter().map(|p| p[1]).sum::<f64>() / n;
        for p in pos.iter_mut() {
            p[0] -= mean_x;
            p[1] -= mean_y;
        }

        let extent = pos
            .iter()
            .flat_map(|p| [p[0].abs(), p[1].abs()])
            .fold(0.0f64, f64::max);
        if extent > 0.0 {
            for p in pos.iter_mut() {
                p[0] *= self.scale / extent;
                p[1] *= self.scale / extent;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id, None);
        }
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "d");
        graph.add_edge("d", "a");
        graph
    }

    #[test]
    fn test_same_seed_same_positions() {
        let layout = SpringLayout::default();
        let graph = square();
        assert_eq!(layout.compute(&graph, 0), layout.compute(&graph, 0));
        assert_ne!(layout.compute(&graph, 0), layout.compute(&graph, 1));
    }

    #[test]
    fn test_positions_are_centred_and_scaled() {
        let positions = SpringLayout::default().compute(&square(), 3);
        assert_eq!(positions.len(), 4);

        let mean_x = positions.values().map(|p| p.x).sum::<f64>() / 4.0;
        let mean_y = positions.values().map(|p| p.y).sum::<f64>() / 4.0;
        assert_relative_eq!(mean_x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(mean_y, 0.0, epsilon = 1e-9);

        let extent = positions
            .values()
            .flat_map(|p| [p.x.abs(), p.y.abs()])
            .fold(0.0f64, f64::max);
        assert_relative_eq!(extent, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trivial_graphs() {
        let layout = SpringLayout::default();
        assert!(layout.compute(&FriendGraph::new(), 0).is_empty());

        let mut single = FriendGraph::new();
        single.add_node("only", None);
        assert_eq!(layout.compute(&single, 9)["only"], Position::default());
    }
}
