//! The clustering engine: dispatch, strategies, result formatting

use std::collections::{HashMap, HashSet};

use crate::cluster::tiers::compute_listener_tiers;
use crate::cluster::{Cluster, ClusterLink, ClusterResult, ClusterStats, TierData};
use crate::config::{ClusterMethod, ClusterOptions, MID_GRAPH_BREAKPOINT};
use crate::data::location::{build_normalized_location_map, calculate_location_similarity};
use crate::data::{Artist, ArtistLink, NameIndex};
use crate::graph::SimilarityGraph;
use crate::similarity::{
    calculate_network_similarities, calculate_tag_similarities, pair_key, SimilarityMap,
    TagVectors,
};
use crate::viz::color_for_cluster;

/// Clusters an immutable snapshot of artists and their known links.
///
/// Construction precomputes the tag vocabulary and index maps once;
/// `cluster` may then be called repeatedly with different options without
/// touching engine state.
pub struct ClusteringEngine {
    artists: Vec<Artist>,
    links: Vec<ArtistLink>,
    name_index: NameIndex,
    id_to_index: HashMap<String, u32>,
    all_tags: Vec<String>,
    tag_index: HashMap<String, usize>,
}

impl ClusteringEngine {
    pub fn new(artists: Vec<Artist>, links: Vec<ArtistLink>) -> Self {
        let name_index = NameIndex::build(&artists);

        let id_to_index: HashMap<String, u32> = artists
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i as u32))
            .collect();

        // Deduplicated tag vocabulary in first-seen order
        let mut all_tags: Vec<String> = Vec::new();
        let mut tag_index: HashMap<String, usize> = HashMap::new();
        for artist in &artists {
            for tag in &artist.tags {
                if !tag_index.contains_key(&tag.name) {
                    tag_index.insert(tag.name.clone(), all_tags.len());
                    all_tags.push(tag.name.clone());
                }
            }
        }

        log::info!(
            "Clustering engine over {} artists, {} links, {} distinct tags",
            artists.len(),
            links.len(),
            all_tags.len()
        );

        Self {
            artists,
            links,
            name_index,
            id_to_index,
            all_tags,
            tag_index,
        }
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    /// Display-name resolver for `artist.similar` references.
    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    /// Run one clustering strategy over the snapshot.
    pub fn cluster(&self, options: &ClusterOptions) -> ClusterResult {
        match options.method {
            ClusterMethod::Louvain => self.cluster_louvain(options),
            ClusterMethod::Hybrid => self.cluster_hybrid(options),
            ClusterMethod::Listeners => self.cluster_listeners(),
        }
    }

    /// Community detection over the existing link network alone.
    fn cluster_louvain(&self, options: &ClusterOptions) -> ClusterResult {
        let n = self.artists.len();
        let mut graph = SimilarityGraph::with_nodes(n);

        // One edge per unique pair; duplicate links are ignored
        let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(self.links.len());
        for link in &self.links {
            if let (Some(&a), Some(&b)) = (
                self.id_to_index.get(&link.source),
                self.id_to_index.get(&link.target),
            ) {
                if a != b && seen.insert(pair_key(a, b)) {
                    graph.add_edge(a, b, 1.0);
                }
            }
        }

        log::info!(
            "Louvain clustering: {} nodes, {} unique link edges, resolution {}",
            n,
            graph.edge_count(),
            options.resolution
        );

        let communities = graph.detect_communities(options.resolution);
        let network = calculate_network_similarities(&self.links, &self.id_to_index);

        // Bounds the emitted link count on large graphs
        let min_link_weight = if n <= MID_GRAPH_BREAKPOINT { 0.2 } else { 0.15 };

        self.format_result(ClusterMethod::Louvain, &communities, &network, min_link_weight)
    }

    /// Weighted combination of tag-vector similarity, network similarity
    /// and a geographic distance penalty.
    fn cluster_hybrid(&self, options: &ClusterOptions) -> ClusterResult {
        let n = self.artists.len();
        let (k_neighbors, min_similarity) = options.tuning_for(n);
        let (w_vec, w_net) = options.hybrid_weights.normalized();
        let penalty_strength = options.hybrid_weights.location_strength();

        let vectors = TagVectors::build(&self.artists, &self.all_tags, &self.tag_index);
        let vector_sims = calculate_tag_similarities(&vectors, k_neighbors, min_similarity, false);
        let network_sims = calculate_network_similarities(&self.links, &self.id_to_index);

        // Weighted sum per canonical pair; one-sided pairs keep their
        // single term
        let mut combined: SimilarityMap =
            HashMap::with_capacity(vector_sims.len() + network_sims.len());
        for (&key, &sim) in &vector_sims {
            *combined.entry(key).or_insert(0.0) += sim * w_vec;
        }
        for (&key, &sim) in &network_sims {
            *combined.entry(key).or_insert(0.0) += sim * w_net;
        }

        // Location penalty: a multiplicative dampener, never applied when
        // either side is unknown
        let countries = self.countries_by_index();
        for (&(a, b), weight) in combined.iter_mut() {
            if let (Some(loc_a), Some(loc_b)) = (countries[a as usize], countries[b as usize]) {
                let sim = calculate_location_similarity(loc_a, loc_b);
                *weight *= 1.0 - penalty_strength * 0.6 * (1.0 - sim);
            }
        }

        let floor = if n > MID_GRAPH_BREAKPOINT { 0.15 } else { 0.12 };
        let min_combined_weight = (min_similarity * w_vec).max(floor);

        let mut pruned: SimilarityMap = combined
            .iter()
            .filter(|&(_, &w)| w >= min_combined_weight)
            .map(|(&k, &w)| (k, w))
            .collect();

        self.reconnect_isolated(
            &mut pruned,
            &combined,
            &vectors,
            w_vec,
            min_combined_weight,
        );

        log::info!(
            "Hybrid clustering: {} combined pairs, {} after pruning (min weight {:.3})",
            combined.len(),
            pruned.len(),
            min_combined_weight
        );

        let mut graph = SimilarityGraph::with_nodes(n);
        for (&(a, b), &weight) in &pruned {
            graph.add_edge(a, b, weight);
        }
        let communities = graph.detect_communities(options.resolution);

        // Emitted links use the same threshold that drove clustering
        self.format_result(ClusterMethod::Hybrid, &communities, &pruned, min_combined_weight)
    }

    /// Percentile bucketing by listener count; no graph, no links.
    fn cluster_listeners(&self) -> ClusterResult {
        let (tiers, node_to_tier) = compute_listener_tiers(&self.artists);

        let method = ClusterMethod::Listeners;
        let mut clusters: HashMap<String, Cluster> = HashMap::with_capacity(tiers.len());
        let mut artist_to_cluster: HashMap<String, String> =
            HashMap::with_capacity(self.artists.len());

        for tier in &tiers {
            let cluster_id = format!("{}-{}", method.prefix(), tier.id);
            clusters.insert(
                cluster_id.clone(),
                Cluster {
                    id: cluster_id,
                    name: tier.name.clone(),
                    artist_ids: Vec::new(),
                    color: tier.color.clone(),
                    centroid: None,
                },
            );
        }

        for artist in &self.artists {
            if let Some(&tier_id) = node_to_tier.get(&artist.id) {
                let cluster_id = format!("{}-{}", method.prefix(), tier_id);
                if let Some(cluster) = clusters.get_mut(&cluster_id) {
                    cluster.artist_ids.push(artist.id.clone());
                }
                artist_to_cluster.insert(artist.id.clone(), cluster_id);
            }
        }

        let stats = calculate_stats(&clusters);

        ClusterResult {
            method,
            clusters,
            artist_to_cluster,
            links: Vec::new(),
            stats,
            tier_data: Some(TierData {
                node_to_tier,
                tiers,
            }),
        }
    }

    /// Normalized country per dense artist index.
    fn countries_by_index(&self) -> Vec<Option<&'static str>> {
        let by_id = build_normalized_location_map(&self.artists);
        self.artists
            .iter()
            .map(|a| by_id.get(&a.id).copied())
            .collect()
    }

    /// Reconnect artists left with zero edges after pruning.
    ///
    /// First choice is the artist's best pre-filter penalized edge; failing
    /// that, its single best raw-cosine partner gets a synthesized edge so
    /// the artist joins a cluster instead of exploding into singletons.
    fn reconnect_isolated(
        &self,
        pruned: &mut SimilarityMap,
        penalized: &SimilarityMap,
        vectors: &TagVectors,
        w_vec: f64,
        min_combined_weight: f64,
    ) {
        let n = self.artists.len();
        let mut degree = vec![0u32; n];
        for &(a, b) in pruned.keys() {
            degree[a as usize] += 1;
            degree[b as usize] += 1;
        }

        // Best surviving pre-filter edge per node; weight ties break toward
        // the smaller key so repeated runs patch identically
        let mut best_penalized: Vec<Option<((u32, u32), f64)>> = vec![None; n];
        for (&key, &weight) in penalized {
            for node in [key.0, key.1] {
                let slot = &mut best_penalized[node as usize];
                let better = slot.map_or(true, |(best_key, best_weight)| {
                    weight > best_weight || (weight == best_weight && key < best_key)
                });
                if better {
                    *slot = Some((key, weight));
                }
            }
        }

        let mut reconnected = 0usize;
        for i in 0..n {
            if degree[i] > 0 {
                continue;
            }

            let patch = if let Some((key, weight)) = best_penalized[i] {
                Some((key, weight))
            } else {
                vectors.best_partner(i).map(|(partner, cosine)| {
                    let weight = (cosine * w_vec).max(min_combined_weight);
                    (pair_key(i as u32, partner), weight)
                })
            };

            if let Some((key, weight)) = patch {
                pruned.entry(key).or_insert(weight);
                degree[key.0 as usize] += 1;
                degree[key.1 as usize] += 1;
                reconnected += 1;
            }
        }

        if reconnected > 0 {
            log::debug!("Reconnected {} isolated artists", reconnected);
        }
    }

    /// Group a community assignment into the uniform result shape shared
    /// by the louvain and hybrid methods.
    fn format_result(
        &self,
        method: ClusterMethod,
        communities: &[usize],
        similarities: &SimilarityMap,
        min_link_weight: f64,
    ) -> ClusterResult {
        let mut clusters: HashMap<String, Cluster> = HashMap::new();
        let mut artist_to_cluster: HashMap<String, String> =
            HashMap::with_capacity(self.artists.len());

        for (index, &community) in communities.iter().enumerate() {
            let cluster_id = format!("{}-{}", method.prefix(), community);
            let cluster = clusters.entry(cluster_id.clone()).or_insert_with(|| Cluster {
                id: cluster_id.clone(),
                name: format!("{} {}", method.label(), community),
                artist_ids: Vec::new(),
                color: color_for_cluster(&cluster_id),
                centroid: None,
            });
            cluster.artist_ids.push(self.artists[index].id.clone());
            artist_to_cluster.insert(self.artists[index].id.clone(), cluster_id);
        }

        // Cross-cluster similarity is computed but never emitted
        let mut surviving: Vec<((u32, u32), f64)> = similarities
            .iter()
            .filter(|&(&(a, b), &weight)| {
                weight >= min_link_weight && communities[a as usize] == communities[b as usize]
            })
            .map(|(&key, &weight)| (key, weight))
            .collect();
        surviving.sort_unstable_by_key(|&(key, _)| key);

        let links: Vec<ClusterLink> = surviving
            .into_iter()
            .map(|((a, b), weight)| ClusterLink {
                source: self.artists[a as usize].id.clone(),
                target: self.artists[b as usize].id.clone(),
                weight,
            })
            .collect();

        let stats = calculate_stats(&clusters);
        log::info!(
            "{} clustering produced {} clusters, {} intra-cluster links",
            method.prefix(),
            stats.cluster_count,
            links.len()
        );

        ClusterResult {
            method,
            clusters,
            artist_to_cluster,
            links,
            stats,
            tier_data: None,
        }
    }
}

/// Stats over non-empty clusters. Empty input yields a NaN average.
fn calculate_stats(clusters: &HashMap<String, Cluster>) -> ClusterStats {
    let sizes: Vec<usize> = clusters
        .values()
        .map(|c| c.artist_ids.len())
        .filter(|&s| s > 0)
        .collect();

    let cluster_count = sizes.len();
    let total: usize = sizes.iter().sum();

    ClusterStats {
        cluster_count,
        avg_cluster_size: total as f64 / cluster_count as f64,
        largest_cluster: sizes.iter().copied().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tag;

    fn artist(id: &str, tags: &[(&str, u32)], location: Option<&str>) -> Artist {
        Artist {
            id: id.to_string(),
            name: id.to_string(),
            listeners: None,
            tags: tags
                .iter()
                .map(|&(name, count)| Tag {
                    name: name.to_string(),
                    count,
                })
                .collect(),
            genres: Vec::new(),
            similar: Vec::new(),
            location: location.map(str::to_string),
        }
    }

    fn link(source: &str, target: &str) -> ArtistLink {
        ArtistLink {
            source: source.to_string(),
            target: target.to_string(),
            link_type: None,
        }
    }

    fn bare(id: &str) -> Artist {
        artist(id, &[], None)
    }

    #[test]
    fn test_louvain_chain_scenario() {
        // A-B and B-C linked, no tags, no location: one connected
        // component, exactly the two input links emitted at weight 1.0
        let engine = ClusteringEngine::new(
            vec![bare("a"), bare("b"), bare("c")],
            vec![link("a", "b"), link("b", "c")],
        );
        let result = engine.cluster(&ClusterOptions::default());

        assert_eq!(result.stats.cluster_count, 1);
        assert_eq!(result.artist_to_cluster.len(), 3);
        assert_eq!(result.links.len(), 2);
        for l in &result.links {
            assert_eq!(l.weight, 1.0);
        }
    }

    #[test]
    fn test_totality_and_partition() {
        let artists = vec![
            artist("a", &[("ambient", 10)], None),
            artist("b", &[("ambient", 8)], None),
            artist("c", &[("metal", 5)], None),
            bare("d"),
        ];
        let engine = ClusteringEngine::new(artists, vec![link("a", "b")]);

        for method in [ClusterMethod::Louvain, ClusterMethod::Hybrid, ClusterMethod::Listeners] {
            let result = engine.cluster(&ClusterOptions {
                method,
                ..Default::default()
            });

            assert_eq!(result.artist_to_cluster.len(), 4, "{:?}", method);

            // Union of cluster members is exactly the input set, once each
            let mut seen: Vec<&str> = Vec::new();
            for cluster in result.clusters.values() {
                assert_eq!(&result.artist_to_cluster[&cluster.artist_ids[0]], &cluster.id);
                for id in &cluster.artist_ids {
                    assert!(!seen.contains(&id.as_str()), "duplicate member {}", id);
                    seen.push(id);
                }
            }
            assert_eq!(seen.len(), 4);
        }
    }

    #[test]
    fn test_links_are_intra_cluster_only() {
        let artists = vec![
            artist("a", &[("ambient", 10), ("idm", 4)], None),
            artist("b", &[("ambient", 9), ("idm", 5)], None),
            artist("c", &[("metal", 10), ("doom", 4)], None),
            artist("d", &[("metal", 9), ("doom", 5)], None),
        ];
        let engine = ClusteringEngine::new(artists, vec![link("a", "b"), link("c", "d")]);

        let result = engine.cluster(&ClusterOptions {
            method: ClusterMethod::Hybrid,
            ..Default::default()
        });

        for l in &result.links {
            assert_eq!(
                result.artist_to_cluster[&l.source],
                result.artist_to_cluster[&l.target]
            );
        }
    }

    #[test]
    fn test_hybrid_reconnects_blank_artist() {
        // Zero tags, zero links, unknown location: still assigned
        let artists = vec![
            artist("a", &[("ambient", 10)], Some("Berlin, Germany")),
            artist("b", &[("ambient", 9)], Some("Hamburg, Germany")),
            bare("ghost"),
        ];
        let engine = ClusteringEngine::new(artists, vec![link("a", "b")]);

        let result = engine.cluster(&ClusterOptions {
            method: ClusterMethod::Hybrid,
            ..Default::default()
        });
        assert!(result.artist_to_cluster.contains_key("ghost"));
    }

    #[test]
    fn test_hybrid_location_penalty_dampens_cross_region_pairs() {
        let near = vec![
            artist("a", &[("techno", 10)], Some("Berlin, Germany")),
            artist("b", &[("techno", 10)], Some("Cologne, Germany")),
        ];
        let far = vec![
            artist("a", &[("techno", 10)], Some("Berlin, Germany")),
            artist("b", &[("techno", 10)], Some("Tokyo, Japan")),
        ];

        let weight_of = |artists: Vec<Artist>| {
            let engine = ClusteringEngine::new(artists, Vec::new());
            let result = engine.cluster(&ClusterOptions {
                method: ClusterMethod::Hybrid,
                ..Default::default()
            });
            result.links.first().map(|l| l.weight).unwrap_or(0.0)
        };

        let same_country = weight_of(near);
        let cross_region = weight_of(far);
        assert!(same_country > cross_region);
        // Identical tags, same country: full vector weight survives
        assert!((same_country - 0.6).abs() < 1e-9);
        // Cross region: 0.6 * (1 - 0.3 * 0.6)
        assert!((cross_region - 0.6 * 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_location_is_not_penalized() {
        let artists = vec![
            artist("a", &[("techno", 10)], Some("Berlin, Germany")),
            artist("b", &[("techno", 10)], None),
        ];
        let engine = ClusteringEngine::new(artists, Vec::new());
        let result = engine.cluster(&ClusterOptions {
            method: ClusterMethod::Hybrid,
            ..Default::default()
        });

        assert_eq!(result.links.len(), 1);
        assert!((result.links[0].weight - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_louvain_idempotent() {
        let artists: Vec<Artist> = (0..20).map(|i| bare(&format!("a{}", i))).collect();
        let links: Vec<ArtistLink> = (0..19)
            .map(|i| link(&format!("a{}", i), &format!("a{}", (i + 3) % 20)))
            .collect();
        let engine = ClusteringEngine::new(artists, links);

        let first = engine.cluster(&ClusterOptions::default());
        let second = engine.cluster(&ClusterOptions::default());
        assert_eq!(first.artist_to_cluster, second.artist_to_cluster);
    }

    #[test]
    fn test_unknown_method_defaults_to_louvain() {
        let engine = ClusteringEngine::new(vec![bare("a"), bare("b")], vec![link("a", "b")]);
        let result = engine.cluster(&ClusterOptions {
            method: ClusterMethod::parse("definitely-not-a-method"),
            ..Default::default()
        });
        assert_eq!(result.method, ClusterMethod::Louvain);
    }

    #[test]
    fn test_cluster_colors_stable_within_run() {
        let engine = ClusteringEngine::new(
            vec![bare("a"), bare("b"), bare("c"), bare("d")],
            vec![link("a", "b"), link("c", "d")],
        );
        let first = engine.cluster(&ClusterOptions::default());
        let second = engine.cluster(&ClusterOptions::default());

        for (id, cluster) in &first.clusters {
            assert_eq!(cluster.color, second.clusters[id].color);
        }
    }

    #[test]
    fn test_stats_over_nonempty_clusters() {
        let engine = ClusteringEngine::new(
            vec![bare("a"), bare("b"), bare("c")],
            vec![link("a", "b")],
        );
        let result = engine.cluster(&ClusterOptions::default());

        // {a,b} and singleton {c}
        assert_eq!(result.stats.cluster_count, 2);
        assert_eq!(result.stats.largest_cluster, 2);
        assert!((result.stats.avg_cluster_size - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_degenerate_stats() {
        let engine = ClusteringEngine::new(Vec::new(), Vec::new());
        let result = engine.cluster(&ClusterOptions::default());

        assert!(result.clusters.is_empty());
        assert!(result.artist_to_cluster.is_empty());
        assert!(result.stats.avg_cluster_size.is_nan());
    }
}
