use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod data;
mod similarity;
mod graph;
mod cluster;
mod storage;
mod viz;

use cluster::ClusteringEngine;
use config::{ClusterMethod, ClusterOptions, HybridWeights};

#[derive(Parser, Debug)]
#[clap(
    name = "artist-cluster-engine",
    about = "Similarity clustering of artist graphs for music-discovery visualization"
)]
struct Cli {
    /// Path to the artist snapshot (JSON array)
    #[clap(long)]
    artists: PathBuf,

    /// Path to the artist link list (JSON array)
    #[clap(long)]
    links: PathBuf,

    /// Clustering method: louvain, hybrid, or listeners
    #[clap(long, default_value = "louvain")]
    method: String,

    /// Louvain resolution parameter (louvain/hybrid only)
    #[clap(long, default_value = "1.0")]
    resolution: f64,

    /// Override the size-adaptive neighbor cap
    #[clap(long)]
    k_neighbors: Option<usize>,

    /// Override the size-adaptive cosine-similarity floor
    #[clap(long)]
    min_similarity: Option<f64>,

    /// Hybrid weight for tag-vector similarity
    #[clap(long, default_value = "0.6")]
    vector_weight: f64,

    /// Hybrid weight for existing-network similarity
    #[clap(long, default_value = "0.4")]
    network_weight: f64,

    /// Hybrid location penalty strength (0-1)
    #[clap(long, default_value = "0.3")]
    location_weight: f64,

    /// Output directory for results
    #[clap(long, default_value = "cluster_results")]
    output_dir: String,

    /// Skip the force-graph export
    #[clap(long)]
    skip_viz: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting artist cluster analysis");

    std::fs::create_dir_all(&args.output_dir)?;

    // 1. Load the snapshot
    let artists = data::artists::load_artists(&args.artists)?;
    let links = data::artists::load_links(&args.links)?;

    // 2. Build the engine and run the selected method
    let engine = ClusteringEngine::new(artists, links);
    let options = ClusterOptions {
        method: ClusterMethod::parse(&args.method),
        resolution: args.resolution,
        k_neighbors: args.k_neighbors,
        min_similarity: args.min_similarity,
        hybrid_weights: HybridWeights {
            vectors: args.vector_weight,
            network: args.network_weight,
            location: args.location_weight,
        },
    };
    let result = engine.cluster(&options);

    log::info!(
        "Found {} clusters (largest {})",
        result.stats.cluster_count,
        result.stats.largest_cluster
    );

    // 3. Save results
    storage::save_results(&result, &args.output_dir)?;

    // 4. Export the force-graph payload if requested
    if !args.skip_viz {
        viz::export_force_graph(&result, engine.artists(), &args.output_dir)?;
    }

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
