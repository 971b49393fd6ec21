//! Results persistence module

use anyhow::Result;
use itertools::Itertools;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::cluster::ClusterResult;

/// Save a clustering result to the given directory.
///
/// Writes `result.json` (the full result) and `summary.json` (stats plus
/// per-cluster sizes).
pub fn save_results(result: &ClusterResult, output_dir: &str) -> Result<()> {
    log::info!(
        "Saving {} clusters to {}",
        result.stats.cluster_count,
        output_dir
    );

    fs::create_dir_all(output_dir)?;

    let result_path = Path::new(output_dir).join("result.json");
    let mut result_file = File::create(&result_path)?;
    result_file.write_all(to_string_pretty(result)?.as_bytes())?;

    save_summary(result, output_dir)?;

    log::info!("Results saved successfully");
    Ok(())
}

fn save_summary(result: &ClusterResult, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let cluster_sizes: Vec<_> = result
        .clusters
        .keys()
        .sorted()
        .map(|id| {
            json!({
                "id": id,
                "size": result.clusters[id].artist_ids.len(),
            })
        })
        .collect();

    let summary = json!({
        "method": result.method,
        "cluster_stats": {
            "cluster_count": result.stats.cluster_count,
            "avg_cluster_size": result.stats.avg_cluster_size,
            "largest_cluster": result.stats.largest_cluster,
            "clustered_artists": result.artist_to_cluster.len(),
            "intra_cluster_links": result.links.len(),
        },
        "clusters": cluster_sizes,
        "tier_count": result.tier_data.as_ref().map(|t| t.tiers.len()),
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;
    Ok(())
}
