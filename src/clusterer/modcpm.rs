//! The CPM/plain-modularity clusterer adapter [from original:
//! `leiden_wrapper.py`'s `LeidenClusterer`, reworked around a CLI
//! subprocess contract instead of an in-process `leidenalg` call since
//! that library has no Rust equivalent in the retrieval pack].

use std::path::Path;
use std::process::Command;

use tracing::instrument;

use crate::clusterer::group_into_intangibles;
use crate::config::Context;
use crate::error::{RefinerError, Result};
use crate::graph::{Intangible, Realized};

#[instrument(skip(ctx, subgraph), fields(index = %subgraph.index))]
pub fn run(
    ctx: &Context,
    tool_path: &Path,
    resolution: Option<f64>,
    cpm: bool,
    subgraph: &Realized,
) -> Result<Vec<Intangible>> {
    let input_path = ctx.request_graph_related_path(&subgraph.index, "edgelist")?;
    std::fs::write(&input_path, subgraph.to_compact_edgelist_string()).map_err(|source| {
        RefinerError::Io { path: input_path.clone(), source }
    })?;
    let output_path = ctx.request_graph_related_path(&subgraph.index, "modcpm.csv")?;

    let mut cmd = Command::new(tool_path);
    cmd.arg("--input").arg(&input_path).arg("--output").arg(&output_path);
    if let Some(r) = resolution {
        cmd.arg("--resolution").arg(r.to_string());
    }
    cmd.arg(if cpm { "--cpm" } else { "--modularity" });

    let status = cmd.status().map_err(|e| {
        RefinerError::ExternalTool(format!("failed to launch {}: {e}", tool_path.display()))
    })?;
    if !status.success() || !output_path.exists() {
        return Err(RefinerError::ExternalTool(format!(
            "{} exited with {status} (or produced no output)",
            tool_path.display()
        )));
    }

    let pairs = parse_csv(&output_path)?;
    let hydrated = pairs
        .into_iter()
        .map(|(local, cluster_number)| {
            (subgraph.original_id(local), format!("{}{}", subgraph.index, cluster_number + 1))
        });
    let groups = group_into_intangibles(hydrated)?;
    Ok(groups)
}

/// Parses the `node,cluster` output CSV into `(local_node_id, cluster_number)` pairs.
fn parse_csv(path: &Path) -> Result<Vec<(u32, u32)>> {
    let text = std::fs::read_to_string(path).map_err(|source| RefinerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split(',');
        let (node, cluster) = (cols.next(), cols.next());
        match (node, cluster) {
            (Some(node), Some(cluster)) => {
                let node: u32 = node.trim().parse().map_err(|_| {
                    RefinerError::ExternalTool(format!("malformed clusterer output line: {line}"))
                })?;
                let cluster: u32 = cluster.trim().parse().map_err(|_| {
                    RefinerError::ExternalTool(format!("malformed clusterer output line: {line}"))
                })?;
                out.push((node, cluster));
            }
            _ => {
                return Err(RefinerError::ExternalTool(format!(
                    "malformed clusterer output line: {line}"
                )));
            }
        }
    }
    Ok(out)
}

/// Reads a whitespace-separated `node cluster_id` existing clustering (spec §6).
pub fn from_existing_clustering(path: &Path) -> Result<Vec<Intangible>> {
    let text = std::fs::read_to_string(path).map_err(|source| RefinerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut pairs = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut parts = line.split_whitespace();
        let (node, cluster) = (parts.next(), parts.next());
        match (node, cluster) {
            (Some(node), Some(cluster)) => {
                let node: u32 = node.parse().map_err(|_| {
                    RefinerError::InputValidation(format!("malformed clustering line: {line}"))
                })?;
                pairs.push((node, cluster.to_string()));
            }
            _ => {
                return Err(RefinerError::InputValidation(format!(
                    "malformed clustering line: {line}"
                )));
            }
        }
    }
    group_into_intangibles(pairs.into_iter())
}
