use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use connectivity_refiner::GraphStore;
use connectivity_refiner::cli::{ClustererToolPaths, Opts};
use connectivity_refiner::config::{Context, TransientGuard};
use connectivity_refiner::engine::{self, ClusterIgnoreFilter};
use connectivity_refiner::error::RefinerError;
use connectivity_refiner::io;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "connectivity-refiner failed");
            if let RefinerError::Internal(ref msg) = err {
                debug_assert!(false, "internal invariant violated: {msg}");
            }
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run() -> Result<(), RefinerError> {
    let opts = Opts::parse();

    let ctx = Context::load(opts.working_dir(), opts.transient, opts.config.as_deref())?;
    let _guard = TransientGuard::new(&ctx);

    let clusterer = opts.clusterer(ClustererToolPaths {
        modcpm: ctx.modcpm_path.clone(),
        ikc: ctx.ikc_path.clone(),
    })?;
    let requirement = opts.requirement(clusterer.kind())?;
    let filter = ClusterIgnoreFilter {
        ignore_trees: opts.ignore_trees,
        ignore_smaller_than: opts.ignore_smaller_than,
    };

    tracing::info!(
        input = %opts.input.display(),
        working_dir = %ctx.working_dir.display(),
        "starting connectivity-refiner"
    );

    let graph = GraphStore::from_edgelist(&opts.input)?;
    tracing::info!(n = graph.n(), m = graph.m(), "loaded graph");

    let initial_clusters = match &opts.existing_clustering {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading existing clustering");
            clusterer.from_existing_clustering(path)?
        }
        None => {
            tracing::info!("running first round of clustering before algorithm-g");
            let whole = graph.as_root_realized();
            clusterer.cluster_without_singletons(&ctx, &whole)?
        }
    };
    tracing::info!(num_clusters = initial_clusters.len(), "first round of clustering obtained");

    let (_final_clusters, node2cids, tree) =
        engine::algorithm_g(&graph, initial_clusters, &clusterer, &requirement, &filter, &ctx)?;

    io::write_membership(&opts.output, &node2cids)?;
    io::write_tree(&io::tree_path(&opts.output), &tree)?;

    Ok(())
}
