//! Weighted Louvain community detection
//!
//! Two-phase modularity optimization (Blondel et al. 2008): greedy local
//! moves until no gain, then aggregation of communities into a meta-graph,
//! repeated until modularity stops improving. Node scans run in index order
//! and gain ties break toward the lowest community id, so the partition is
//! deterministic for a fixed graph construction order.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Louvain community detector over edge-weighted undirected graphs.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma); higher values produce smaller
    /// communities.
    resolution: f64,
    /// Maximum local-moving iterations per level.
    max_iter: usize,
    /// Maximum aggregation levels.
    max_levels: usize,
    /// Minimum modularity improvement to continue to another level.
    min_modularity_gain: f64,
}

impl Louvain {
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Detect communities, returning one consecutive community id per node
    /// index. Isolated nodes each form their own community; an empty graph
    /// yields an empty assignment.
    pub fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Vec<usize> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }
        if graph.edge_count() == 0 {
            return (0..n).collect();
        }

        // Flatten to a weighted edge list on dense indices
        let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(graph.edge_count());
        let mut self_loops = vec![0.0; n];
        for edge in graph.edge_references() {
            let i = edge.source().index();
            let j = edge.target().index();
            let w = *edge.weight();
            if i == j {
                self_loops[i] += w;
            } else {
                edges.push((i.min(j), i.max(j), w));
            }
        }

        let mut current_n = n;
        let mut current_edges = edges;
        let mut current_self_loops = self_loops;

        // Stack of community->member mappings for expanding the final
        // partition back to original nodes
        let mut mapping_stack: Vec<Vec<Vec<usize>>> = Vec::new();
        let mut prev_modularity = f64::NEG_INFINITY;

        for _level in 0..self.max_levels {
            let (partition, improved) =
                self.local_moving(current_n, &current_edges, &current_self_loops);

            if !improved {
                break;
            }

            let modularity = self.modularity(
                current_n,
                &current_edges,
                &current_self_loops,
                &partition,
            );
            if modularity - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = modularity;

            let (new_edges, new_self_loops, node_mapping) =
                aggregate(&current_edges, &current_self_loops, &partition);

            if node_mapping.len() == current_n {
                break;
            }

            current_n = node_mapping.len();
            current_edges = new_edges;
            current_self_loops = new_self_loops;
            mapping_stack.push(node_mapping);
        }

        // Expand from the coarsest level back down to original nodes
        let mut result: Vec<usize> = (0..current_n).collect();
        while let Some(mapping) = mapping_stack.pop() {
            result = expand_partition(&result, &mapping, n);
        }
        result.resize(n, 0);

        renumber(&result)
    }

    /// Modularity of a partition over a weighted graph.
    fn modularity(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> f64 {
        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return 0.0;
        }

        let mut degrees = vec![0.0; n];
        for &(i, j, w) in edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }

        let mut q = 0.0;
        for &(i, j, w) in edges {
            if communities[i] == communities[j] {
                let expected = degrees[i] * degrees[j] / (2.0 * m);
                q += w - self.resolution * expected;
            }
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            if sl > 0.0 {
                let expected = degrees[i] * degrees[i] / (2.0 * m);
                q += sl - self.resolution * expected / 2.0;
            }
        }

        q / m
    }

    /// Phase 1: greedy node moves. Returns (communities, any_improved).
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
    ) -> (Vec<usize>, bool) {
        // Weighted adjacency, neighbor lists in index order for
        // deterministic scanning
        let mut adj: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for &(i, j, w) in edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let mut degrees = vec![0.0; n];
        for &(i, j, w) in edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_improved = false;

        for _iter in 0..self.max_iter {
            let mut improved = false;

            for node in 0..n {
                let current = communities[node];
                let ki = degrees[node];

                community_degrees[current] -= ki;

                // Edge weight from this node into each neighboring
                // community, sorted by community id for stable ties
                let mut weights_to: HashMap<usize, f64> = HashMap::new();
                for (&neighbor, &w) in &adj[node] {
                    *weights_to.entry(communities[neighbor]).or_insert(0.0) += w;
                }
                let mut candidates: Vec<(usize, f64)> = weights_to.into_iter().collect();
                candidates.sort_unstable_by_key(|&(comm, _)| comm);

                let mut best_community = current;
                let mut best_gain = 0.0;
                for (target, ki_in) in candidates {
                    let sigma_tot = community_degrees[target];
                    let gain = ki_in / m - self.resolution * sigma_tot * ki / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best_community = target;
                    }
                }

                if best_community != current {
                    communities[node] = best_community;
                    community_degrees[best_community] += ki;
                    improved = true;
                    any_improved = true;
                } else {
                    community_degrees[current] += ki;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

/// Phase 2: collapse communities into a meta-graph.
/// Returns (new_edges, new_self_loops, new_node -> original members).
fn aggregate(
    edges: &[(usize, usize, f64)],
    self_loops: &[f64],
    communities: &[usize],
) -> (Vec<(usize, usize, f64)>, Vec<f64>, Vec<Vec<usize>>) {
    let mut unique: Vec<usize> = communities.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let n_new = unique.len();

    let comm_to_new: HashMap<usize, usize> =
        unique.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    let mut new_to_old: Vec<Vec<usize>> = vec![Vec::new(); n_new];
    for (node, &comm) in communities.iter().enumerate() {
        new_to_old[comm_to_new[&comm]].push(node);
    }

    let mut new_edge_weights: HashMap<(usize, usize), f64> = HashMap::new();
    let mut new_self_loops = vec![0.0; n_new];

    for &(i, j, w) in edges {
        let ci = comm_to_new[&communities[i]];
        let cj = comm_to_new[&communities[j]];
        if ci == cj {
            new_self_loops[ci] += w;
        } else {
            let key = (ci.min(cj), ci.max(cj));
            *new_edge_weights.entry(key).or_insert(0.0) += w;
        }
    }
    for (i, &sl) in self_loops.iter().enumerate() {
        new_self_loops[comm_to_new[&communities[i]]] += sl;
    }

    let mut new_edges: Vec<(usize, usize, f64)> = new_edge_weights
        .into_iter()
        .map(|((i, j), w)| (i, j, w))
        .collect();
    // Stable edge order keeps later levels deterministic
    new_edges.sort_unstable_by_key(|&(i, j, _)| (i, j));

    (new_edges, new_self_loops, new_to_old)
}

/// Expand a partition from an aggregated level to the level below it.
fn expand_partition(partition: &[usize], mapping: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut result = vec![0; n];
    for (agg_node, members) in mapping.iter().enumerate() {
        for &original in members {
            result[original] = partition[agg_node];
        }
    }
    result
}

/// Renumber community ids to consecutive integers in first-seen order.
fn renumber(communities: &[usize]) -> Vec<usize> {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    communities
        .iter()
        .map(|&c| {
            let next = remap.len();
            *remap.entry(c).or_insert(next)
        })
        .collect()
}
