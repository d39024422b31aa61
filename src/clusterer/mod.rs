//! The clustering adapter (C3): two variants over the same interface,
//! both wrapping an external subprocess. A tagged enum rather than a
//! trait object, per spec.md §9 ("polymorphism via tagged variants") —
//! the variant set is closed and small.

mod ikc;
mod modcpm;

use std::path::{Path, PathBuf};

use crate::config::Context;
use crate::error::{RefinerError, Result};
use crate::graph::{Intangible, Realized};

/// Which external engine backs a [`Clusterer`], used wherever behavior
/// depends on the variant without needing the whole value (e.g.
/// `Requirement::threshold`'s `k` term).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClustererKind {
    ModCpm,
    ModMod,
    Ikc,
}

/// A configured clustering engine: CPM-flavored modularity, plain
/// modularity, or IKC. Each carries what it needs to invoke its own
/// subprocess.
#[derive(Debug, Clone)]
pub enum Clusterer {
    ModCpm { tool_path: PathBuf, resolution: f64 },
    ModMod { tool_path: PathBuf },
    Ikc { tool_path: PathBuf, k: u32 },
}

impl Clusterer {
    pub fn kind(&self) -> ClustererKind {
        match self {
            Clusterer::ModCpm { .. } => ClustererKind::ModCpm,
            Clusterer::ModMod { .. } => ClustererKind::ModMod,
            Clusterer::Ikc { .. } => ClustererKind::Ikc,
        }
    }

    pub fn k(&self) -> Option<u32> {
        match self {
            Clusterer::Ikc { k, .. } => Some(*k),
            _ => None,
        }
    }

    /// Clusters `subgraph`, returning one intangible cluster per
    /// non-empty group the external tool emits, singletons included.
    pub fn cluster(&self, ctx: &Context, subgraph: &Realized) -> Result<Vec<Intangible>> {
        match self {
            Clusterer::ModCpm { tool_path, resolution } => {
                modcpm::run(ctx, tool_path, Some(*resolution), true, subgraph)
            }
            Clusterer::ModMod { tool_path } => modcpm::run(ctx, tool_path, None, false, subgraph),
            Clusterer::Ikc { tool_path, k } => ikc::run(ctx, tool_path, *k, subgraph),
        }
    }

    /// `cluster`, with singleton clusters dropped. What every caller in
    /// this crate actually wants [from original:
    /// `abstract_clusterer.py`'s `cluster_without_singletons`].
    pub fn cluster_without_singletons(
        &self,
        ctx: &Context,
        subgraph: &Realized,
    ) -> Result<Vec<Intangible>> {
        Ok(self
            .cluster(ctx, subgraph)?
            .into_iter()
            .filter(|c| c.n() > 1)
            .collect())
    }

    /// Reads a pre-computed clustering of the whole graph from disk.
    pub fn from_existing_clustering(&self, path: &Path) -> Result<Vec<Intangible>> {
        match self {
            Clusterer::Ikc { .. } => ikc::from_existing_clustering(path),
            Clusterer::ModCpm { .. } | Clusterer::ModMod { .. } => {
                modcpm::from_existing_clustering(path)
            }
        }
    }
}

/// Groups `(node, cluster_id)` pairs into one [`Intangible`] per
/// distinct cluster id, dropping empty groups and erroring if nothing
/// survives [from original: `IntangibleSubgraph.from_assignment_pairs`].
pub(crate) fn group_into_intangibles(
    pairs: impl Iterator<Item = (u32, String)>,
) -> Result<Vec<Intangible>> {
    let mut groups: hashbrown::HashMap<String, Vec<u32>> = hashbrown::HashMap::new();
    for (node, cluster_id) in pairs {
        groups.entry(cluster_id).or_default().push(node);
    }
    if groups.is_empty() {
        return Err(RefinerError::InputValidation(
            "no clusters found in assignment input".to_string(),
        ));
    }
    groups
        .into_iter()
        .filter(|(_, nodes)| !nodes.is_empty())
        .map(|(index, nodes)| Intangible::new(nodes, index))
        .collect()
}
