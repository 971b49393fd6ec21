//! Weighted-graph abstraction and community detection

pub mod louvain;

pub use louvain::Louvain;

use petgraph::graph::{NodeIndex, UnGraph};

/// Undirected weighted graph over dense artist indices.
///
/// Thin wrapper around petgraph so the clustering engine only depends on
/// node/edge insertion and one community-detection call.
pub struct SimilarityGraph {
    graph: UnGraph<u32, f64>,
    nodes: Vec<NodeIndex>,
}

impl SimilarityGraph {
    /// Create a graph with one node per artist index `0..n`.
    pub fn with_nodes(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, n * 4);
        let nodes = (0..n as u32).map(|i| graph.add_node(i)).collect();
        Self { graph, nodes }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add an undirected weighted edge between two artist indices.
    pub fn add_edge(&mut self, a: u32, b: u32, weight: f64) {
        self.graph
            .add_edge(self.nodes[a as usize], self.nodes[b as usize], weight);
    }

    /// Run Louvain community detection, returning one community id per
    /// artist index. Deterministic for a fixed construction order.
    pub fn detect_communities(&self, resolution: f64) -> Vec<usize> {
        Louvain::new().with_resolution(resolution).detect(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_nodes_get_distinct_communities() {
        let graph = SimilarityGraph::with_nodes(3);
        let communities = graph.detect_communities(1.0);
        assert_eq!(communities.len(), 3);
        assert_ne!(communities[0], communities[1]);
        assert_ne!(communities[1], communities[2]);
    }

    #[test]
    fn test_chain_forms_single_community() {
        let mut graph = SimilarityGraph::with_nodes(3);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 1.0);

        let communities = graph.detect_communities(1.0);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
    }
}
