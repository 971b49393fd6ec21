//! Clustering options and size-adaptive defaults

use serde::{Serialize, Deserialize};

/// Artist count above which the engine switches to the mid-size
/// k-NN/similarity defaults.
pub const MID_GRAPH_BREAKPOINT: usize = 1000;

/// Artist count above which the engine switches to the large-graph
/// k-NN/similarity defaults.
pub const LARGE_GRAPH_BREAKPOINT: usize = 2000;

/// Clustering strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMethod {
    /// Community detection over the existing artist link network.
    Louvain,
    /// Weighted combination of tag-vector and network similarity.
    Hybrid,
    /// Percentile bucketing by listener count, no graph involved.
    Listeners,
}

impl ClusterMethod {
    /// Parse a method name, defaulting to `Louvain` for anything
    /// unrecognized rather than failing.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "louvain" => Self::Louvain,
            "hybrid" => Self::Hybrid,
            "listeners" => Self::Listeners,
            other => {
                log::warn!("Unknown clustering method '{}', using louvain", other);
                Self::Louvain
            }
        }
    }

    /// Prefix used in cluster ids, e.g. `hybrid-3`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Louvain => "louvain",
            Self::Hybrid => "hybrid",
            Self::Listeners => "listeners",
        }
    }

    /// Human label used in cluster names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Louvain => "Community",
            Self::Hybrid => "Hybrid Community",
            Self::Listeners => "Popularity Tier",
        }
    }
}

/// Relative weights for the hybrid method's similarity sources.
///
/// `vectors` and `network` are re-normalized to sum to 1.0 before use.
/// `location` is a penalty strength in [0, 1], not an additive weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HybridWeights {
    pub vectors: f64,
    pub network: f64,
    pub location: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vectors: 0.6,
            network: 0.4,
            location: 0.3,
        }
    }
}

impl HybridWeights {
    /// Normalized (vectors, network) weights summing to 1.0.
    ///
    /// Degenerate all-zero weights fall back to the defaults.
    pub fn normalized(&self) -> (f64, f64) {
        let total = self.vectors + self.network;
        if total <= 0.0 {
            let d = Self::default();
            return (d.vectors, d.network);
        }
        (self.vectors / total, self.network / total)
    }

    /// Location penalty strength clamped to [0, 1].
    pub fn location_strength(&self) -> f64 {
        self.location.clamp(0.0, 1.0)
    }
}

/// Options accepted by `ClusteringEngine::cluster`.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub method: ClusterMethod,

    /// Louvain resolution parameter; higher values bias toward more,
    /// smaller communities. Applies to louvain/hybrid only.
    pub resolution: f64,

    /// Override for the size-adaptive neighbor cap.
    pub k_neighbors: Option<usize>,

    /// Override for the size-adaptive cosine-similarity floor.
    pub min_similarity: Option<f64>,

    pub hybrid_weights: HybridWeights,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            method: ClusterMethod::Louvain,
            resolution: 1.0,
            k_neighbors: None,
            min_similarity: None,
            hybrid_weights: HybridWeights::default(),
        }
    }
}

impl ClusterOptions {
    /// Effective (k_neighbors, min_similarity) for a given artist count.
    ///
    /// Larger graphs get fewer neighbors and a higher floor; the tradeoff
    /// is result density against wall-clock time.
    pub fn tuning_for(&self, artist_count: usize) -> (usize, f64) {
        let (k, min_sim) = if artist_count > LARGE_GRAPH_BREAKPOINT {
            (8, 0.3)
        } else if artist_count > MID_GRAPH_BREAKPOINT {
            (8, 0.25)
        } else {
            (15, 0.2)
        };
        (
            self.k_neighbors.unwrap_or(k),
            self.min_similarity.unwrap_or(min_sim),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_defaults_to_louvain() {
        assert_eq!(ClusterMethod::parse("hybrid"), ClusterMethod::Hybrid);
        assert_eq!(ClusterMethod::parse("LISTENERS"), ClusterMethod::Listeners);
        assert_eq!(ClusterMethod::parse("spectral"), ClusterMethod::Louvain);
    }

    #[test]
    fn test_size_adaptive_tuning() {
        let opts = ClusterOptions::default();
        assert_eq!(opts.tuning_for(500), (15, 0.2));
        assert_eq!(opts.tuning_for(1500), (8, 0.25));
        assert_eq!(opts.tuning_for(2500), (8, 0.3));
    }

    #[test]
    fn test_tuning_overrides() {
        let opts = ClusterOptions {
            k_neighbors: Some(20),
            min_similarity: Some(0.1),
            ..Default::default()
        };
        assert_eq!(opts.tuning_for(2500), (20, 0.1));
    }

    #[test]
    fn test_hybrid_weight_normalization() {
        let (v, n) = HybridWeights::default().normalized();
        assert!((v - 0.6).abs() < 1e-12);
        assert!((n - 0.4).abs() < 1e-12);

        let skewed = HybridWeights {
            vectors: 3.0,
            network: 1.0,
            location: 2.0,
        };
        let (v, n) = skewed.normalized();
        assert!((v - 0.75).abs() < 1e-12);
        assert!((n - 0.25).abs() < 1e-12);
        assert!((skewed.location_strength() - 1.0).abs() < 1e-12);
    }
}
