//! Tag-vector, TF-IDF and network similarity computation
//!
//! Similarity maps are keyed by a canonical unordered pair of dense artist
//! indices, so each pair has exactly one entry regardless of the direction
//! it was discovered from.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::data::{Artist, ArtistLink};

/// Canonical unordered artist-index pair (lo, hi).
pub type PairKey = (u32, u32);

/// Undirected similarity map over canonical pair keys.
pub type SimilarityMap = HashMap<PairKey, f64>;

/// Artist counts below this are scored sequentially; the pairwise pass
/// only pays for rayon on larger graphs.
const PARALLEL_THRESHOLD: usize = 1000;

/// Canonical key for an unordered artist pair.
pub fn pair_key(a: u32, b: u32) -> PairKey {
    if a < b { (a, b) } else { (b, a) }
}

/// TF-IDF weighted tag vectors for every artist, with precomputed norms.
pub struct TagVectors {
    vectors: Vec<Vec<f64>>,
    norms: Vec<f64>,
}

impl TagVectors {
    /// Build one dense vector per artist over the shared tag vocabulary.
    ///
    /// Vector value at a tag's slot is `ln(1 + count) * idf`, where idf is
    /// the smoothed inverse document frequency
    /// `ln((n + 1) / (doc_freq + 1)) + 1`. Document frequency counts each
    /// artist once per tag even when a tag repeats in its list.
    pub fn build(
        artists: &[Artist],
        all_tags: &[String],
        tag_index: &HashMap<String, usize>,
    ) -> Self {
        let n = artists.len();

        // Document frequency per tag slot
        let mut doc_freq = vec![0u32; all_tags.len()];
        for artist in artists {
            let mut seen: HashSet<usize> = HashSet::with_capacity(artist.tags.len());
            for tag in &artist.tags {
                if let Some(&slot) = tag_index.get(&tag.name) {
                    if seen.insert(slot) {
                        doc_freq[slot] += 1;
                    }
                }
            }
        }

        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((n as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
            .collect();

        let mut vectors = Vec::with_capacity(n);
        let mut norms = Vec::with_capacity(n);

        for artist in artists {
            let mut vector = vec![0.0; all_tags.len()];
            for tag in &artist.tags {
                if let Some(&slot) = tag_index.get(&tag.name) {
                    vector[slot] = (1.0 + tag.count as f64).ln() * idf[slot];
                }
            }
            let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
            vectors.push(vector);
            norms.push(norm);
        }

        Self { vectors, norms }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine similarity between two artists' tag vectors.
    ///
    /// Zero when either vector has zero magnitude.
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        let norm_product = self.norms[a] * self.norms[b];
        if norm_product == 0.0 {
            return 0.0;
        }

        let dot: f64 = self.vectors[a]
            .iter()
            .zip(&self.vectors[b])
            .map(|(x, y)| x * y)
            .sum();

        dot / norm_product
    }

    /// The single highest-cosine partner for an artist, ignoring any
    /// neighbor cap or similarity floor. None when every pairing scores
    /// zero or there is no other artist.
    pub fn best_partner(&self, i: usize) -> Option<(u32, f64)> {
        let mut best: Option<(u32, f64)> = None;
        for j in 0..self.vectors.len() {
            if j == i {
                continue;
            }
            let sim = self.cosine(i, j);
            if sim > 0.0 && best.map_or(true, |(_, s)| sim > s) {
                best = Some((j as u32, sim));
            }
        }
        best
    }

    /// Per-artist top-k neighbor lists, similarity descending, restricted
    /// to pairs at or above `min_similarity`.
    fn top_k_neighbors(&self, k_neighbors: usize, min_similarity: f64) -> Vec<Vec<(u32, f64)>> {
        let n = self.vectors.len();

        let score_one = |i: usize| -> Vec<(u32, f64)> {
            let mut neighbors: Vec<(u32, f64)> = (0..n)
                .filter(|&j| j != i)
                .filter_map(|j| {
                    let sim = self.cosine(i, j);
                    (sim >= min_similarity).then_some((j as u32, sim))
                })
                .collect();

            neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            neighbors.truncate(k_neighbors);
            neighbors
        };

        if n < PARALLEL_THRESHOLD {
            (0..n).map(score_one).collect()
        } else {
            (0..n).into_par_iter().map(score_one).collect()
        }
    }
}

/// k-NN restricted tag similarity map.
///
/// With `mutual_only`, a pair survives only when each artist lists the
/// other in its own top-k (weight = min of the two sides); this keeps a
/// similar-to-everyone hub from wiring itself to the whole graph.
/// Otherwise one-sided entries survive and the larger side wins.
pub fn calculate_tag_similarities(
    vectors: &TagVectors,
    k_neighbors: usize,
    min_similarity: f64,
    mutual_only: bool,
) -> SimilarityMap {
    let top_k = vectors.top_k_neighbors(k_neighbors, min_similarity);
    let mut map = SimilarityMap::new();

    if mutual_only {
        for (i, neighbors) in top_k.iter().enumerate() {
            for &(j, sim_ij) in neighbors {
                if (j as usize) < i {
                    continue; // handled from the lower index
                }
                let reverse = top_k[j as usize]
                    .iter()
                    .find(|&&(back, _)| back as usize == i);
                if let Some(&(_, sim_ji)) = reverse {
                    map.insert(pair_key(i as u32, j), sim_ij.min(sim_ji));
                }
            }
        }
    } else {
        for (i, neighbors) in top_k.iter().enumerate() {
            for &(j, sim) in neighbors {
                let key = pair_key(i as u32, j);
                let entry = map.entry(key).or_insert(sim);
                if sim > *entry {
                    *entry = sim;
                }
            }
        }
    }

    log::debug!(
        "Tag similarity map: {} pairs (k={}, min={}, mutual={})",
        map.len(),
        k_neighbors,
        min_similarity,
        mutual_only
    );
    map
}

/// Convert the supplied link list into a binary similarity map.
///
/// Presence of a link is the only signal: every known pair gets weight 1.0.
/// Links naming unknown artist ids are skipped.
pub fn calculate_network_similarities(
    links: &[ArtistLink],
    id_to_index: &HashMap<String, u32>,
) -> SimilarityMap {
    let mut map = SimilarityMap::new();
    let mut skipped = 0usize;

    for link in links {
        match (id_to_index.get(&link.source), id_to_index.get(&link.target)) {
            (Some(&a), Some(&b)) if a != b => {
                map.insert(pair_key(a, b), 1.0);
            }
            (Some(_), Some(_)) => {} // self-loop
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} links referencing unknown artist ids", skipped);
    }
    map
}
