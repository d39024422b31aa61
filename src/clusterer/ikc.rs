//! The IKC clusterer adapter [from original: `ikc_wrapper.py`'s
//! `IkcClusterer`], invoked exactly per spec.md §6:
//! `python <tool> -e <edge_list> -o <out_csv> -k <k>`.

use std::path::Path;
use std::process::Command;

use tracing::instrument;

use crate::clusterer::group_into_intangibles;
use crate::config::Context;
use crate::error::{RefinerError, Result};
use crate::graph::{Intangible, Realized};

#[instrument(skip(ctx, subgraph), fields(index = %subgraph.index, k))]
pub fn run(ctx: &Context, tool_path: &Path, k: u32, subgraph: &Realized) -> Result<Vec<Intangible>> {
    let output_dir = ctx.request_graph_related_path(&subgraph.index, "ikc")?;
    std::fs::create_dir_all(&output_dir).map_err(|source| RefinerError::Io {
        path: output_dir.clone(),
        source,
    })?;

    let edge_list_path = output_dir.join(format!("{}.local_mapping.edge_list", subgraph.index));
    std::fs::write(&edge_list_path, subgraph.to_compact_edgelist_string()).map_err(|source| {
        RefinerError::Io { path: edge_list_path.clone(), source }
    })?;
    let output_csv = output_dir.join(format!("{}.ikc_clustering.csv", subgraph.index));

    let status = Command::new("python3")
        .arg(tool_path)
        .arg("-e")
        .arg(&edge_list_path)
        .arg("-o")
        .arg(&output_csv)
        .arg("-k")
        .arg(k.to_string())
        .status()
        .map_err(|e| {
            RefinerError::ExternalTool(format!("failed to launch {}: {e}", tool_path.display()))
        })?;
    if !status.success() || !output_csv.exists() {
        return Err(RefinerError::ExternalTool(format!(
            "{} exited with {status} (or produced no output)",
            tool_path.display()
        )));
    }

    let pairs = parse_output(&output_csv)?;
    let hydrated = pairs.into_iter().map(|(local, cluster_number)| {
        (subgraph.original_id(local), format!("{}{}", subgraph.index, cluster_number))
    });
    group_into_intangibles(hydrated)
}

/// Parses IKC's raw CSV: `node,cluster,k,modularity`, no header.
fn parse_output(path: &Path) -> Result<Vec<(u32, u32)>> {
    let text = std::fs::read_to_string(path).map_err(|source| RefinerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() < 2 {
            return Err(RefinerError::ExternalTool(format!(
                "malformed IKC output line: {line}"
            )));
        }
        let node: u32 = cols[0].trim().parse().map_err(|_| {
            RefinerError::ExternalTool(format!("malformed IKC output line: {line}"))
        })?;
        let cluster: u32 = cols[1].trim().parse().map_err(|_| {
            RefinerError::ExternalTool(format!("malformed IKC output line: {line}"))
        })?;
        out.push((node, cluster));
    }
    Ok(out)
}

/// Reads a pre-computed IKC clustering: CSV `node,cluster_id`.
pub fn from_existing_clustering(path: &Path) -> Result<Vec<Intangible>> {
    let text = std::fs::read_to_string(path).map_err(|source| RefinerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut pairs = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut cols = line.split(',');
        match (cols.next(), cols.next()) {
            (Some(node), Some(cluster)) => {
                let node: u32 = node.trim().parse().map_err(|_| {
                    RefinerError::InputValidation(format!("malformed clustering line: {line}"))
                })?;
                pairs.push((node, cluster.trim().to_string()));
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
