//! The minimum-cut oracle adapter (C2): a thin subprocess wrapper
//! around an external cactus-mincut tool, never a mincut algorithm
//! implementation of our own.

use std::path::Path;
use std::process::Command;

use regex::Regex;
use tracing::{instrument, warn};

use crate::config::Context;
use crate::error::{RefinerError, Result};
use crate::graph::Realized;
use crate::types::NodeId;

/// A bipartition of a realized subgraph's vertex set plus the cut size
/// between the two sides, in original-graph ids.
#[derive(Debug, Clone)]
pub struct MincutResult {
    pub light_partition: Vec<NodeId>,
    pub heavy_partition: Vec<NodeId>,
    pub cut_size: u64,
}

impl MincutResult {
    fn degraded() -> MincutResult {
        MincutResult {
            light_partition: Vec::new(),
            heavy_partition: Vec::new(),
            cut_size: 0,
        }
    }
}

/// Runs the external cactus-mincut oracle against `subgraph` and parses
/// its result. A missing output file degrades to a zero-cut result
/// rather than erroring (spec §7's oracle fatal/degrade split), since a
/// subgraph the oracle can't handle (too small, disconnected on its
/// own) is a normal occurrence, not a configuration bug.
#[instrument(skip(ctx, subgraph), fields(index = %subgraph.index))]
pub fn run(ctx: &Context, subgraph: &Realized) -> Result<MincutResult> {
    let metis_path = ctx.request_graph_related_path(&subgraph.index, "metis")?;
    std::fs::write(&metis_path, subgraph.to_metis_string()).map_err(|source| RefinerError::Io {
        path: metis_path.clone(),
        source,
    })?;

    let cut_path = append_suffix(&metis_path, ".cut");

    let output = Command::new(&ctx.oracle_path)
        .args(["-b", "-s", "-o"])
        .arg(&cut_path)
        .arg(&metis_path)
        .arg("cactus")
        .output()
        .map_err(|e| {
            RefinerError::ExternalTool(format!("failed to launch {}: {e}", ctx.oracle_path.display()))
        })?;

    if !cut_path.exists() {
        warn!(path = %cut_path.display(), "mincut oracle produced no output, degrading to zero-cut");
        return Ok(MincutResult::degraded());
    }

    let labels_text = std::fs::read_to_string(&cut_path).map_err(|source| RefinerError::Io {
        path: cut_path.clone(),
        source,
    })?;
    let mut light_partition = Vec::new();
    let mut heavy_partition = Vec::new();
    for (local, line) in labels_text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label: u32 = line
            .parse()
            .map_err(|_| RefinerError::ExternalTool(format!("malformed cut label line: {line}")))?;
        let original = subgraph.original_id(local as u32);
        if label == 0 {
            light_partition.push(original);
        } else {
            heavy_partition.push(original);
        }
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cut_size = stdout
        .lines()
        .next_back()
        .and_then(|last| parse_cut_size(last))
        .unwrap_or_else(|| {
            warn!("mincut oracle stdout carried no cut=<n> marker, defaulting to 0");
            0
        });

    Ok(MincutResult {
        light_partition,
        heavy_partition,
        cut_size,
    })
}

fn parse_cut_size(line: &str) -> Option<u64> {
    let re = Regex::new(r"cut=(\d+)").expect("static regex is valid");
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

fn append_suffix(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    std::path::PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cut_size_from_trailing_marker() {
        assert_eq!(parse_cut_size("some log line cut=42 done"), Some(42));
        assert_eq!(parse_cut_size("no marker here"), None);
    }

    #[test]
    fn append_suffix_concatenates_without_dot_insertion() {
        let p = append_suffix(Path::new("/tmp/abc.metis"), ".cut");
        assert_eq!(p, Path::new("/tmp/abc.metis.cut"));
    }
}
