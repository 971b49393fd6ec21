//! Cluster palette and force-graph export

use anyhow::Result;
use itertools::Itertools;
use serde_json::json;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::cluster::ClusterResult;
use crate::data::Artist;

/// Curated palette indexed by a hash of the cluster id.
const CLUSTER_PALETTE: [&str; 12] = [
    "#ef4444", "#f97316", "#eab308", "#84cc16", "#22c55e", "#14b8a6",
    "#0ea5e9", "#6366f1", "#a855f7", "#d946ef", "#ec4899", "#f43f5e",
];

/// Deterministic hex color for a cluster id.
///
/// FNV-1a over the id modulo the palette, so the same id always maps to
/// the same color within a run.
pub fn color_for_cluster(cluster_id: &str) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in cluster_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    CLUSTER_PALETTE[(hash % CLUSTER_PALETTE.len() as u64) as usize].to_string()
}

/// Write the force-graph payload the rendering layer consumes.
///
/// `graph.json` holds one node per artist (with its cluster assignment and
/// color) and the intra-cluster links from the result.
pub fn export_force_graph(
    result: &ClusterResult,
    artists: &[Artist],
    output_dir: &str,
) -> Result<()> {
    log::info!("Exporting force-graph payload for {} artists", artists.len());

    let viz_dir = Path::new(output_dir).join("visualizations");
    fs::create_dir_all(&viz_dir)?;

    let nodes: Vec<_> = artists
        .iter()
        .map(|artist| {
            let cluster_id = result.artist_to_cluster.get(&artist.id);
            let color = cluster_id
                .and_then(|id| result.clusters.get(id))
                .map(|c| c.color.as_str());
            let tier = result
                .tier_data
                .as_ref()
                .and_then(|t| t.node_to_tier.get(&artist.id));

            json!({
                "id": artist.id,
                "name": artist.name,
                "listeners": artist.listener_count(),
                "cluster": cluster_id,
                "color": color,
                "tier": tier,
            })
        })
        .collect();

    let links: Vec<_> = result
        .links
        .iter()
        .map(|l| json!({ "source": l.source, "target": l.target, "weight": l.weight }))
        .collect();

    let clusters: Vec<_> = result
        .clusters
        .keys()
        .sorted()
        .map(|id| {
            let cluster = &result.clusters[id];
            json!({
                "id": cluster.id,
                "name": cluster.name,
                "color": cluster.color,
                "size": cluster.artist_ids.len(),
            })
        })
        .collect();

    let payload = json!({
        "method": result.method,
        "nodes": nodes,
        "links": links,
        "clusters": clusters,
    });

    let path = viz_dir.join("graph.json");
    let mut file = File::create(&path)?;
    file.write_all(serde_json::to_string_pretty(&payload)?.as_bytes())?;

    log::info!("Force-graph payload written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_deterministic() {
        assert_eq!(color_for_cluster("hybrid-3"), color_for_cluster("hybrid-3"));
    }

    #[test]
    fn test_color_from_palette() {
        for id in ["louvain-0", "hybrid-17", "listeners-5"] {
            let color = color_for_cluster(id);
            assert!(CLUSTER_PALETTE.contains(&color.as_str()));
        }
    }
}
