//! Subgraph handles (spec §3): `Intangible` (a vertex subset plus an
//! index label) and `Realized` (an owned induced subgraph plus a
//! hydrator). Together they form the `SubgraphView` tagged variant
//! from spec.md §9 — kept as two concrete types here since their
//! operations barely overlap, with `realize`/`to_intangible` as the
//! bridge between them.

use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::error::{RefinerError, Result};
use crate::graph::store::GraphStore;
use crate::types::{NodeId, UnGraph};

/// A yet-to-be-realized subgraph: just a vertex subset and an index.
#[derive(Debug, Clone)]
pub struct Intangible {
    subset: Vec<NodeId>,
    nodeset: HashSet<NodeId>,
    pub index: String,
}

impl Intangible {
    /// `ids` must be pairwise distinct; a duplicate is an internal
    /// invariant violation (spec §7), since callers only ever build
    /// these from sets (mincut partitions, clusterer output, etc).
    pub fn new(ids: Vec<NodeId>, index: String) -> Result<Intangible> {
        if index.is_empty() {
            return Err(RefinerError::Internal(
                "subgraph index must not be empty".to_string(),
            ));
        }
        let nodeset: HashSet<NodeId> = ids.iter().copied().collect();
        if nodeset.len() != ids.len() {
            return Err(RefinerError::Internal(format!(
                "duplicate vertex id in subgraph {index}"
            )));
        }
        Ok(Intangible {
            subset: ids,
            nodeset,
            index,
        })
    }

    pub fn n(&self) -> usize {
        self.subset.len()
    }

    pub fn contains(&self, v: NodeId) -> bool {
        self.nodeset.contains(&v)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subset.iter().copied()
    }

    /// Internal edge count of this subset within `graph`.
    pub fn count_edges(&self, graph: &GraphStore) -> usize {
        graph.internal_edges(&self.nodeset)
    }

    /// Tree-like iff `m == n - 1` (spec §3/§8 — a cheap heuristic that
    /// does not verify acyclicity or connectivity).
    pub fn is_tree_like(&self, graph: &GraphStore) -> bool {
        self.count_edges(graph) == self.n().saturating_sub(1) && self.n() > 0
    }

    /// Realizes this subset into an owned induced subgraph with its
    /// own adjacency and a hydrator. Compact ids are assigned in the
    /// order `subset` was given, so the hydrator is just that order.
    pub fn realize(&self, graph: &GraphStore) -> Result<Realized> {
        let n = self.subset.len();
        let mut data = UnGraph::with_capacity(n, 0);
        let mut compact_of: HashMap<NodeId, u32> = HashMap::with_capacity(n);
        for (new_id, &old_id) in self.subset.iter().enumerate() {
            data.add_node(());
            compact_of.insert(old_id, new_id as u32);
        }
        for &u in &self.subset {
            let cu = compact_of[&u];
            for v in graph.neighbors(u) {
                if let Some(&cv) = compact_of.get(&v) {
                    if cv > cu {
                        data.add_edge(NodeIndex::new(cu as usize), NodeIndex::new(cv as usize), ());
                    }
                }
            }
        }
        Ok(Realized {
            index: self.index.clone(),
            data,
            hydrator: self.subset.clone(),
            compact_of,
            mcd_cache: None,
        })
    }
}

impl Realized {
    /// Builds a realized view of the whole graph, indexed by the empty
    /// string. The one legitimate empty index: every other subgraph's
    /// index is a non-empty suffix chain built up from this root, used
    /// only to seed the first round of clustering.
    pub(crate) fn whole(graph: &GraphStore) -> Realized {
        let n = graph.n();
        let hydrator: Vec<NodeId> = (0..n as NodeId).collect();
        let compact_of: HashMap<NodeId, u32> = hydrator.iter().map(|&id| (id, id)).collect();
        Realized {
            index: String::new(),
            data: graph.data().clone(),
            hydrator,
            compact_of,
            mcd_cache: None,
        }
    }
}

/// An owned induced subgraph plus a hydrator mapping compact local ids
/// back to original ids in `G`.
#[derive(Debug)]
pub struct Realized {
    pub index: String,
    data: UnGraph,
    hydrator: Vec<NodeId>,
    compact_of: HashMap<NodeId, u32>,
    mcd_cache: Option<u64>,
}

impl Realized {
    pub fn n(&self) -> usize {
        self.data.node_count()
    }

    pub fn m(&self) -> usize {
        self.data.edge_count()
    }

    pub fn degree(&self, local: u32) -> u64 {
        self.data.neighbors(NodeIndex::new(local as usize)).count() as u64
    }

    pub fn neighbors(&self, local: u32) -> impl Iterator<Item = u32> + '_ {
        self.data
            .neighbors(NodeIndex::new(local as usize))
            .map(|n| n.index() as u32)
    }

    /// Local (compact) ids currently present, `0..n`.
    pub fn local_ids(&self) -> impl Iterator<Item = u32> {
        0..self.n() as u32
    }

    /// Hydrates a local id back to its original id in `G`.
    pub fn original_id(&self, local: u32) -> NodeId {
        self.hydrator[local as usize]
    }

    /// `min` degree over the realized subgraph; 0 for an empty graph.
    /// Memoized; invalidated by `remove_node`.
    pub fn mcd(&mut self) -> u64 {
        if let Some(cached) = self.mcd_cache {
            return cached;
        }
        let value = self
            .local_ids()
            .map(|v| self.degree(v))
            .min()
            .unwrap_or(0);
        self.mcd_cache = Some(value);
        value
    }

    /// Removes a vertex by its local id. Mirrors petgraph's
    /// swap-remove: the last local id is reassigned to `local`'s slot,
    /// keeping ids compact over `0..n-1`. Invalidates the `mcd` cache.
    pub fn remove_node(&mut self, local: u32) {
        let removed_original = self.hydrator[local as usize];
        self.compact_of.remove(&removed_original);
        self.data.remove_node(NodeIndex::new(local as usize));

        let last = self.hydrator.len() - 1;
        if local as usize != last {
            let moved_original = self.hydrator[last];
            self.hydrator[local as usize] = moved_original;
            self.compact_of.insert(moved_original, local);
        }
        self.hydrator.pop();
        self.mcd_cache = None;
    }

    /// Neighbors of an original-id vertex, themselves in original ids.
    /// Lets callers (the pruner) work entirely in stable original ids
    /// instead of compact ids that shift under `remove_node`.
    pub fn original_neighbors(&self, original: NodeId) -> Vec<NodeId> {
        match self.compact_of.get(&original) {
            Some(&local) => self.neighbors(local).map(|l| self.hydrator[l as usize]).collect(),
            None => Vec::new(),
        }
    }

    /// Removes a vertex identified by its original id.
    pub fn remove_original(&mut self, original: NodeId) {
        if let Some(&local) = self.compact_of.get(&original) {
            self.remove_node(local);
        }
    }

    /// All currently-present vertices as an `Intangible`, hydrated to
    /// original ids, keeping this subgraph's current index.
    pub fn to_intangible(&self) -> Intangible {
        Intangible {
            subset: self.hydrator.clone(),
            nodeset: self.hydrator.iter().copied().collect(),
            index: self.index.clone(),
        }
    }

    /// METIS format: a header line `n m`, then one line per vertex
    /// (1-indexed neighbor ids, space separated), for the cut oracle.
    pub fn to_metis_string(&self) -> String {
        let mut out = format!("{} {}\n", self.n(), self.m());
        for v in self.local_ids() {
            let line = self
                .neighbors(v)
                .map(|n| (n + 1).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// A tab-delimited compact edge list, zero-indexed, one edge per
    /// line (spec §4.3: what's handed to the IKC clusterer).
    pub fn to_compact_edgelist_string(&self) -> String {
        let mut out = String::new();
        for v in self.local_ids() {
            for n in self.neighbors(v) {
                if n > v {
                    out.push_str(&format!("{v}\t{n}\n"));
                }
            }
        }
        out
    }
}
