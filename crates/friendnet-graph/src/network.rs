use crate::builder::build_graph;
use crate::community::{community_assignment, CommunityAssignment, CommunityDetector};
use crate::graph::FriendGraph;
use crate::layout::{NodePositions, SpringLayout};
use crate::render::{RenderOptions, RenderPayload};
use crate::scores::{self, NodeScores};
use friendnet_core::{IdentityCollection, IdentityFilter, Result, ScanDataset};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// A scanned network with its derived graph and layout.
///
/// The dataset is read-only. The graph and positions are recomputed together:
/// any change to the graph is followed by a new layout with the current seed.
#[derive(Debug, Clone)]
pub struct FriendNetwork {
    dataset: ScanDataset,
    graph: FriendGraph,
    positions: NodePositions,
    layout: SpringLayout,
    seed: u64,
}

impl FriendNetwork {
    pub fn from_dataset(dataset: ScanDataset) -> Self {
        Self::with_layout(dataset, SpringLayout::default(), 0)
    }

    pub fn with_layout(dataset: ScanDataset, layout: SpringLayout, seed: u64) -> Self {
        let graph = build_graph(&dataset);
        let positions = layout.compute(&graph, seed);
        Self {
            dataset,
            graph,
            positions,
            layout,
            seed,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_dataset(ScanDataset::load(path)?))
    }

    pub fn dataset(&self) -> &ScanDataset {
        &self.dataset
    }

    pub fn graph(&self) -> &FriendGraph {
        &self.graph
    }

    pub fn positions(&self) -> &NodePositions {
        &self.positions
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Keeps only the largest connected component and lays it out again.
    ///
    /// Among equally large components the one holding the earliest friend
    /// wins. Returns the number of nodes removed.
    pub fn filter_biggest_component(&mut self) -> usize {
        let before = self.graph.node_count();
        let components = self.graph.connected_components();

        let mut biggest: Option<&Vec<&str>> = None;
        for component in &components {
            if biggest.map_or(true, |b| component.len() > b.len()) {
                biggest = Some(component);
            }
        }
        let Some(biggest) = biggest else {
            return 0;
        };

        let keep: HashSet<&str> = biggest.iter().copied().collect();
        let filtered = self.graph.subgraph(&keep);
        let removed = before - filtered.node_count();
        info!(
            "Kept biggest of {} components: {} nodes, {} removed",
            components.len(),
            filtered.node_count(),
            removed
        );

        self.graph = filtered;
        self.compute_positions(self.seed);
        removed
    }

    /// Lays out the current graph with `seed`.
    pub fn compute_positions(&mut self, seed: u64) -> &NodePositions {
        self.seed = seed;
        self.positions = self.layout.compute(&self.graph, seed);
        debug!("Computed positions for {} nodes with seed {}", self.positions.len(), seed);
        &self.positions
    }

    pub fn community_assignment(&self, partition: &[Vec<String>]) -> CommunityAssignment {
        community_assignment(&self.graph, partition)
    }

    pub fn detect_communities(&self, detector: &dyn CommunityDetector) -> CommunityAssignment {
        let partition = detector.detect(&self.graph);
        info!("{} found {} communities", detector.name(), partition.len());
        self.community_assignment(&partition)
    }

    pub fn degree_centrality(&self) -> NodeScores {
        scores::degree_centrality(&self.graph)
    }

    pub fn pagerank(&self) -> NodeScores {
        scores::pagerank(&self.graph, scores::PAGERANK_ITERATIONS, scores::PAGERANK_DAMPING)
    }

    pub fn render(&self, options: &RenderOptions<'_>) -> RenderPayload {
        RenderPayload::build(&self.graph, &self.positions, options)
    }

    /// Friends connected to the first friend matching `filter`, in edge order.
    pub fn person_friends(&self, filter: &IdentityFilter) -> Result<IdentityCollection> {
        let person = self.dataset.friends.filter(filter)?;
        let Some(id) = person.id.as_deref() else {
            return Ok(IdentityCollection::default());
        };

        Ok(self
            .graph
            .neighbors(id)
            .into_iter()
            .filter_map(|neighbour| self.dataset.friends.find_by_id(neighbour).cloned())
            .collect())
    }

    pub fn person_friend_names(&self, filter: &IdentityFilter) -> Result<Vec<Option<String>>> {
        Ok(self
            .person_friends(filter)?
            .names()
            .into_iter()
            .map(|name| name.map(str::to_string))
            .collect())
    }
}
