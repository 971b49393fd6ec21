//! Cluster entities and the clustering engine

pub mod engine;
pub mod tiers;

pub use engine::ClusteringEngine;

use serde::{Serialize, Deserialize};
use std::collections::HashMap;

use crate::config::ClusterMethod;

/// Reserved visualization anchor; never set by the engine itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

/// One cluster of artists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Method-prefixed identifier, e.g. `hybrid-3`.
    pub id: String,

    /// Human label, e.g. `Hybrid Community 3`.
    pub name: String,

    /// Member artist ids, order-stable from community detection output.
    pub artist_ids: Vec<String>,

    /// Hex color, deterministic per cluster id within a run.
    pub color: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Centroid>,
}

/// A similarity edge surviving into the visualization output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterLink {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Aggregate statistics over non-empty clusters.
///
/// `avg_cluster_size` is NaN for an empty input; callers guard before
/// rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterStats {
    pub cluster_count: usize,
    pub avg_cluster_size: f64,
    pub largest_cluster: usize,
}

/// A listener-count popularity tier. Tier 5 holds the most-listened
/// artists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub id: u8,
    pub name: String,

    /// Inclusive lower bound on listener count.
    pub min: f64,

    /// Exclusive upper bound; +inf for the open-ended top tier.
    pub max: f64,

    pub color: String,
    pub radius: f64,
}

/// Listener-tier assignments, present only for the `listeners` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierData {
    pub node_to_tier: HashMap<String, u8>,

    /// Tier definitions ordered most to least popular; empty tiers are
    /// dropped.
    pub tiers: Vec<Tier>,
}

/// The engine's sole return type, consumed by the graph-rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    pub method: ClusterMethod,

    /// Cluster id -> cluster.
    pub clusters: HashMap<String, Cluster>,

    /// Artist id -> cluster id; total over the input artist set.
    pub artist_to_cluster: HashMap<String, String>,

    /// Intra-cluster similarity edges only.
    pub links: Vec<ClusterLink>,

    pub stats: ClusterStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_data: Option<TierData>,
}
