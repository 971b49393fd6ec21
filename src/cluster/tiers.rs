//! Percentile-based listener tiers
//!
//! Not graph-based: the actual listener-count distribution is sorted and
//! split into five equal-size index ranges, so tiers track the data rather
//! than fixed thresholds. Tier 5 is the most-popular fifth; the top tier's
//! upper bound is open-ended.

use std::collections::HashMap;

use crate::cluster::Tier;
use crate::data::Artist;

pub const TIER_COUNT: usize = 5;

/// Fixed (color, radius) per tier slot, most to least popular.
const TIER_STYLES: [(&str, f64); TIER_COUNT] = [
    ("#eab308", 22.0), // yellow
    ("#22c55e", 18.0), // green
    ("#0ea5e9", 14.0), // sky
    ("#a855f7", 10.0), // purple
    ("#f43f5e", 7.0),  // rose
];

/// Compute tier definitions and per-artist assignments.
///
/// Returns tiers ordered most to least popular (ids 5 down to 1) with
/// empty tiers already dropped, plus artist id -> tier id.
pub fn compute_listener_tiers(artists: &[Artist]) -> (Vec<Tier>, HashMap<String, u8>) {
    if artists.is_empty() {
        return (Vec::new(), HashMap::new());
    }

    let mut counts: Vec<u64> = artists.iter().map(|a| a.listener_count()).collect();
    counts.sort_unstable();

    let n = counts.len();
    let chunk = n / TIER_COUNT;

    // Boundaries between adjacent tiers; tier ranges are contiguous and
    // half-open, the last range absorbs the index remainder
    let mut tiers: Vec<Tier> = Vec::with_capacity(TIER_COUNT);
    for range in 0..TIER_COUNT {
        let id = (range + 1) as u8; // range 0 = least popular = tier 1
        let min = if range == 0 {
            0.0
        } else {
            counts[range * chunk] as f64
        };
        let max = if range == TIER_COUNT - 1 {
            f64::INFINITY
        } else {
            counts[(range + 1) * chunk] as f64
        };

        let style = TIER_STYLES[TIER_COUNT - 1 - range];
        tiers.push(Tier {
            id,
            name: format!("Popularity Tier {}", id),
            min,
            max,
            color: style.0.to_string(),
            radius: style.1,
        });
    }

    // Most popular first, matching the palette order
    tiers.reverse();

    let mut node_to_tier: HashMap<String, u8> = HashMap::with_capacity(artists.len());
    let mut members_per_tier: HashMap<u8, usize> = HashMap::new();

    for artist in artists {
        let count = artist.listener_count() as f64;
        let tier_id = tiers
            .iter()
            .find(|t| count >= t.min && count < t.max)
            // Boundary edge cases land in the least popular tier
            .or_else(|| tiers.last())
            .map(|t| t.id)
            .unwrap_or(1);

        *members_per_tier.entry(tier_id).or_insert(0) += 1;
        node_to_tier.insert(artist.id.clone(), tier_id);
    }

    tiers.retain(|t| members_per_tier.get(&t.id).copied().unwrap_or(0) > 0);

    log::debug!(
        "Listener tiers: {} non-empty of {} over {} artists",
        tiers.len(),
        TIER_COUNT,
        artists.len()
    );

    (tiers, node_to_tier)
}
