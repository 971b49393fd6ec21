//! End-to-end clustering scenarios over synthetic artist snapshots

use std::collections::{HashMap, HashSet};

use artist_cluster_engine::cluster::ClusteringEngine;
use artist_cluster_engine::config::{ClusterMethod, ClusterOptions};
use artist_cluster_engine::data::{Artist, ArtistLink, Tag};

fn artist(id: &str, listeners: u64, tags: &[(&str, u32)], location: Option<&str>) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        listeners: Some(listeners),
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

/// Two tag scenes plus an internal link network: every artist assigned,
/// members partitioned exactly once, links intra-cluster only.
#[test]
fn test_hybrid_end_to_end_partition() {
    let mut artists = Vec::new();
    let mut links = Vec::new();

    for i in 0..12 {
        let id = format!("amb{}", i);
        artists.push(artist(
            &id,
            10_000 + i as u64,
            &[("ambient", 10), ("drone", 4 + (i % 3) as u32)],
            Some("Berlin, Germany"),
        ));
        if i > 0 {
            links.push(link(&format!("amb{}", i - 1), &id));
        }
    }
    for i in 0..12 {
        let id = format!("met{}", i);
        artists.push(artist(
            &id,
            50_000 + i as u64,
            &[("metal", 10), ("doom", 4 + (i % 3) as u32)],
            Some("Oslo, Norway"),
        ));
        if i > 0 {
            links.push(link(&format!("met{}", i - 1), &id));
        }
    }

    let engine = ClusteringEngine::new(artists.clone(), links);
    let result = engine.cluster(&ClusterOptions {
        method: ClusterMethod::Hybrid,
        ..Default::default()
    });

    // Totality
    assert_eq!(result.artist_to_cluster.len(), artists.len());
    for id in result.artist_to_cluster.values() {
        assert!(result.clusters.contains_key(id));
    }

    // Exact partition
    let mut seen: HashSet<&str> = HashSet::new();
    for cluster in result.clusters.values() {
        for member in &cluster.artist_ids {
            assert!(seen.insert(member), "artist {} in two clusters", member);
        }
    }
    assert_eq!(seen.len(), artists.len());

    // Intra-cluster links only
    for l in &result.links {
        assert_eq!(
            result.artist_to_cluster[&l.source],
            result.artist_to_cluster[&l.target]
        );
    }

    // The two scenes must not share a cluster
    assert_ne!(
        result.artist_to_cluster["amb0"],
        result.artist_to_cluster["met0"]
    );
    assert_eq!(
        result.artist_to_cluster["amb0"],
        result.artist_to_cluster["amb11"]
    );
}

/// Uniform random listener counts must spread into five near-equal tiers.
#[test]
fn test_listeners_end_to_end_tiers() {
    let artists: Vec<Artist> = (0..10_000)
        .map(|i| {
            // Multiplicative hash keeps counts spread over 1..10M without
            // pulling in an RNG
            let listeners = ((i as u64).wrapping_mul(2_654_435_761) % 10_000_000) + 1;
            artist(&format!("a{}", i), listeners, &[], None)
        })
        .collect();

    let engine = ClusteringEngine::new(artists, Vec::new());
    let result = engine.cluster(&ClusterOptions {
        method: ClusterMethod::Listeners,
        ..Default::default()
    });

    assert_eq!(result.stats.cluster_count, 5);
    assert!(result.links.is_empty());

    let tier_data = result.tier_data.as_ref().expect("listeners tier data");
    assert_eq!(tier_data.tiers.len(), 5);
    assert_eq!(tier_data.node_to_tier.len(), 10_000);

    // Within a few percent of 2000 each
    let mut sizes: HashMap<u8, usize> = HashMap::new();
    for &tier in tier_data.node_to_tier.values() {
        *sizes.entry(tier).or_insert(0) += 1;
    }
    for tier in 1..=5u8 {
        let size = sizes[&tier];
        assert!(
            (1900..=2100).contains(&size),
            "tier {} holds {} artists",
            tier,
            size
        );
    }

    // Contiguous ranges, higher tier id means higher listener range
    for pair in tier_data.tiers.windows(2) {
        assert_eq!(pair[0].id, pair[1].id + 1);
        assert_eq!(pair[1].max, pair[0].min);
        assert!(pair[0].min >= pair[1].min);
    }
}

/// Repeated calls on one engine instance are deterministic across methods.
#[test]
fn test_repeat_calls_idempotent() {
    let mut artists = Vec::new();
    let mut links = Vec::new();
    for i in 0..60 {
        let scene = if i % 2 == 0 { "house" } else { "jazz" };
        artists.push(artist(
            &format!("a{}", i),
            (i as u64 + 1) * 777,
            &[(scene, 5 + (i % 4) as u32)],
            None,
        ));
        if i >= 2 {
            links.push(link(&format!("a{}", i - 2), &format!("a{}", i)));
        }
    }

    let engine = ClusteringEngine::new(artists, links);
    for method in [ClusterMethod::Louvain, ClusterMethod::Hybrid, ClusterMethod::Listeners] {
        let options = ClusterOptions {
            method,
            ..Default::default()
        };
        let first = engine.cluster(&options);
        let second = engine.cluster(&options);
        assert_eq!(
            first.artist_to_cluster, second.artist_to_cluster,
            "{:?} not deterministic",
            method
        );
    }
}
