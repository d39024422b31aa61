//! The hierarchy tree (C7): every decision algorithm-G makes (a split,
//! a prune, a filtered-out or cut-valid leaf) becomes a node, keyed by
//! its subgraph's index string.
//!
//! [from original: `hm01/cm.py`'s `ClusterTreeNode`/`annotate_tree_node`,
//! backed there by `treeswift.Tree` and serialized with `jsonpickle`.]
//! Represented here as a flat arena (parent-owned children by index)
//! rather than the owned/`Rc` tree the rest of the crate otherwise
//! avoids, since the arena is only ever walked root-to-leaf and torn
//! down once, at serialization time.

use hashbrown::HashMap;
use serde::Serialize;

use crate::error::{RefinerError, Result};

#[derive(Debug)]
struct ArenaNode {
    label: String,
    num_nodes: usize,
    cut_size: Option<u64>,
    validity_threshold: Option<f64>,
    extant: bool,
    children: Vec<usize>,
}

/// An arena-backed hierarchy tree, addressed by subgraph index.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<ArenaNode>,
    index_of: HashMap<String, usize>,
}

impl Tree {
    /// Creates the tree with a single root node for the global graph
    /// (whose index is conventionally the empty string).
    pub fn new(root_label: String, root_n: usize) -> Tree {
        let mut index_of = HashMap::new();
        index_of.insert(root_label.clone(), 0);
        Tree {
            nodes: vec![ArenaNode {
                label: root_label,
                num_nodes: root_n,
                cut_size: None,
                validity_threshold: None,
                extant: false,
                children: Vec::new(),
            }],
            index_of,
        }
    }

    /// Adds a node for `label` as a child of `parent_label`'s node.
    /// A duplicate label is an internal invariant violation: indices
    /// are unique by construction everywhere else in the crate.
    pub fn add_child(&mut self, parent_label: &str, label: String, n: usize) -> Result<()> {
        let parent_idx = *self.index_of.get(parent_label).ok_or_else(|| {
            RefinerError::Internal(format!("tree: unknown parent label {parent_label:?}"))
        })?;
        if self.index_of.contains_key(&label) {
            return Err(RefinerError::Internal(format!(
                "tree: duplicate node label {label:?}"
            )));
        }
        let new_idx = self.nodes.len();
        self.nodes.push(ArenaNode {
            label: label.clone(),
            num_nodes: n,
            cut_size: None,
            validity_threshold: None,
            extant: false,
            children: Vec::new(),
        });
        self.nodes[parent_idx].children.push(new_idx);
        self.index_of.insert(label, new_idx);
        Ok(())
    }

    pub fn set_cut_size(&mut self, label: &str, cut_size: u64) -> Result<()> {
        self.node_mut(label)?.cut_size = Some(cut_size);
        Ok(())
    }

    pub fn set_validity_threshold(&mut self, label: &str, threshold: f64) -> Result<()> {
        self.node_mut(label)?.validity_threshold = Some(threshold);
        Ok(())
    }

    pub fn set_extant(&mut self, label: &str, extant: bool) -> Result<()> {
        self.node_mut(label)?.extant = extant;
        Ok(())
    }

    fn node_mut(&mut self, label: &str) -> Result<&mut ArenaNode> {
        let idx = *self
            .index_of
            .get(label)
            .ok_or_else(|| RefinerError::Internal(format!("tree: unknown label {label:?}")))?;
        Ok(&mut self.nodes[idx])
    }

    /// Serializes the tree to pretty-printed JSON, field names matching
    /// the node tuple in spec.md §3.
    pub fn to_json(&self) -> Result<String> {
        let owned = self.build_owned(0);
        serde_json::to_string_pretty(&owned)
            .map_err(|e| RefinerError::Internal(format!("tree serialization failed: {e}")))
    }

    fn build_owned(&self, idx: usize) -> SerializedNode {
        let node = &self.nodes[idx];
        SerializedNode {
            label: node.label.clone(),
            num_nodes: node.num_nodes,
            cut_size: node.cut_size,
            validity_threshold: node.validity_threshold,
            extant: node.extant,
            children: node.children.iter().map(|&c| self.build_owned(c)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SerializedNode {
    label: String,
    num_nodes: usize,
    cut_size: Option<u64>,
    validity_threshold: Option<f64>,
    extant: bool,
    children: Vec<SerializedNode>,
}
