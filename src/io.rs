//! Output writing (spec §6): the `node cluster_id` membership file and
//! its sibling `.tree.json` hierarchy file.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;

use crate::error::{RefinerError, Result};
use crate::tree::Tree;
use crate::types::NodeId;

/// Writes one `node cluster_id` line per entry, unordered (matching
/// the original's dict-iteration order, which callers should not rely
/// on either).
pub fn write_membership(path: &Path, node2cids: &HashMap<NodeId, String>) -> Result<()> {
    let mut out = String::new();
    for (node, cid) in node2cids {
        out.push_str(&format!("{node} {cid}\n"));
    }
    std::fs::write(path, out).map_err(|source| RefinerError::Io { path: path.to_path_buf(), source })
}

pub fn write_tree(path: &Path, tree: &Tree) -> Result<()> {
    let json = tree.to_json()?;
    std::fs::write(path, json).map_err(|source| RefinerError::Io { path: path.to_path_buf(), source })
}

/// `<output>.tree.json`, the sibling path for the hierarchy file.
pub fn tree_path(output: &Path) -> PathBuf {
    let mut s = output.as_os_str().to_os_string();
    s.push(".tree.json");
    PathBuf::from(s)
}
