//! The global graph store (C1): an immutable `G` plus cheap subgraph
//! extraction. `G`'s vertex ids are the dense `0..n` range handed out
//! at construction time and are never renumbered afterwards.

use std::io::{BufRead, BufReader};
use std::path::Path;

use hashbrown::HashSet;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::instrument;

use crate::error::{RefinerError, Result};
use crate::graph::subgraph::{Intangible, Realized};
use crate::types::{NodeId, UnGraph};

fn ix(v: NodeId) -> NodeIndex {
    NodeIndex::new(v as usize)
}

/// The global graph `G`. Created once, never mutated.
#[derive(Debug)]
pub struct GraphStore {
    data: UnGraph,
}

impl GraphStore {
    /// Builds `G` from a list of `(u, v)` edges. Vertex ids are assumed
    /// dense over `0..=max(u, v)`; any gaps become isolated vertices.
    pub fn from_edges(edges: &[(u32, u32)]) -> GraphStore {
        let n = edges
            .iter()
            .flat_map(|&(u, v)| [u, v])
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        let mut data = UnGraph::with_capacity(n as usize, edges.len());
        for _ in 0..n {
            data.add_node(());
        }
        for &(u, v) in edges {
            if u != v && !data.contains_edge(ix(u), ix(v)) {
                data.add_edge(ix(u), ix(v), ());
            }
        }
        GraphStore { data }
    }

    /// Reads a tab-separated, zero-indexed, undirected edge list (spec
    /// §6): one edge per line, no self-loops, no duplicate edges.
    #[instrument]
    pub fn from_edgelist(path: &Path) -> Result<GraphStore> {
        let file = std::fs::File::open(path).map_err(|source| RefinerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut edges = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|source| RefinerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split('\t');
            let u = parts.next();
            let v = parts.next();
            match (u, v) {
                (Some(u), Some(v)) => {
                    let u: u32 = u.trim().parse().map_err(|_| {
                        RefinerError::InputValidation(format!("malformed edge line: {line}"))
                    })?;
                    let v: u32 = v.trim().parse().map_err(|_| {
                        RefinerError::InputValidation(format!("malformed edge line: {line}"))
                    })?;
                    edges.push((u, v));
                }
                _ => {
                    return Err(RefinerError::InputValidation(format!(
                        "malformed edge line: {line}"
                    )));
                }
            }
        }
        Ok(GraphStore::from_edges(&edges))
    }

    /// A complete graph on `n` vertices.
    pub fn clique(n: u32) -> GraphStore {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        GraphStore::from_edges(&edges)
    }

    /// A path graph on `n` vertices: `0-1-2-...-(n-1)`.
    pub fn path(n: u32) -> GraphStore {
        let edges: Vec<(u32, u32)> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        GraphStore::from_edges(&edges)
    }

    /// An Erdős–Rényi random graph on `n` vertices with edge probability
    /// `p`, for tests. Seeded for reproducibility.
    pub fn erdos_renyi(n: u32, p: f64, seed: u64) -> GraphStore {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.random::<f64>() < p {
                    edges.push((i, j));
                }
            }
        }
        GraphStore::from_edges(&edges)
    }

    pub fn n(&self) -> usize {
        self.data.node_count()
    }

    pub fn m(&self) -> usize {
        self.data.edge_count()
    }

    pub fn degree(&self, v: NodeId) -> usize {
        self.data.neighbors(ix(v)).count()
    }

    pub fn neighbors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.data.neighbors(ix(v)).map(|n| n.index() as NodeId)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.n() as NodeId
    }

    /// Builds an intangible handle over `ids` (a vertex subset plus an
    /// index label). `ids` must be pairwise distinct.
    pub fn intangible_subgraph(&self, ids: Vec<NodeId>, index: String) -> Result<Intangible> {
        Intangible::new(ids, index)
    }

    /// Materializes the induced subgraph over `ids` directly.
    pub fn induced_subgraph(&self, ids: &[NodeId], index: String) -> Result<Realized> {
        let intangible = Intangible::new(ids.to_vec(), index)?;
        intangible.realize(self)
    }

    pub(crate) fn data(&self) -> &UnGraph {
        &self.data
    }

    /// A realized view of the whole graph, indexed by the empty
    /// string, for the first round of clustering.
    pub fn as_root_realized(&self) -> Realized {
        Realized::whole(self)
    }

    /// `mod(S) = ℓ(S)/L − (d(S)/(2L))²` (spec §4.1).
    pub fn modularity_of(&self, subset: &Intangible) -> f64 {
        let big_l = self.m() as f64;
        if big_l == 0.0 {
            return 0.0;
        }
        let nodeset: HashSet<NodeId> = subset.nodes().collect();
        let ls = subset.count_edges(self) as f64;
        let ds: f64 = nodeset.iter().map(|&v| self.degree(v) as f64).sum();
        (ls / big_l) - (ds / (2.0 * big_l)).powi(2)
    }

    /// Internal edges of `S` within `G` (both endpoints in `S`).
    pub(crate) fn internal_edges(&self, nodeset: &HashSet<NodeId>) -> usize {
        let mut count = 0;
        for edge in self.data.edge_references() {
            let u = edge.source().index() as NodeId;
            let v = edge.target().index() as NodeId;
            if nodeset.contains(&u) && nodeset.contains(&v) {
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clique_has_all_pairs() {
        let g = GraphStore::clique(5);
        assert_eq!(g.n(), 5);
        assert_eq!(g.m(), 10);
        for v in g.nodes() {
            assert_eq!(g.degree(v), 4);
        }
    }

    #[test]
    fn path_has_n_minus_one_edges() {
        let g = GraphStore::path(10);
        assert_eq!(g.n(), 10);
        assert_eq!(g.m(), 9);
        assert_eq!(g.degree(0), 1);
        assert_eq!(g.degree(5), 2);
    }

    #[test]
    fn modularity_formula_matches_spec() {
        let g = GraphStore::clique(4);
        let s = g.intangible_subgraph(vec![0, 1], "s".to_string()).unwrap();
        let big_l = g.m() as f64;
        let ls = 1.0; // single edge between 0 and 1
        let ds = (g.degree(0) + g.degree(1)) as f64;
        let expected = (ls / big_l) - (ds / (2.0 * big_l)).powi(2);
        assert!((g.modularity_of(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn from_edgelist_rejects_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.tsv");
        std::fs::write(&path, "0\t1\nnot-a-number\t2\n").unwrap();
        let err = GraphStore::from_edgelist(&path).unwrap_err();
        assert!(matches!(err, RefinerError::InputValidation(_)));
    }

    #[test]
    fn from_edgelist_reads_tab_separated_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.tsv");
        std::fs::write(&path, "0\t1\n1\t2\n2\t0\n").unwrap();
        let g = GraphStore::from_edgelist(&path).unwrap();
        assert_eq!(g.n(), 3);
        assert_eq!(g.m(), 3);
    }
}
