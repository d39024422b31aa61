//! The low-degree pruner (C5): repeatedly strips the globally-lowest-
//! degree vertex from a realized subgraph while doing so keeps it
//! under the connectivity requirement's threshold.
//!
//! [from original: `hm01/pruner.py`'s `prune_graph`, adapted from a
//! `heapdict` decrease-key structure to a lazy-deletion binary heap —
//! entries are pushed with their degree at push time and a pop is
//! discarded if it no longer matches the live degree map.]

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use tracing::instrument;

use crate::clusterer::ClustererKind;
use crate::graph::Realized;
use crate::requirement::Requirement;
use crate::types::NodeId;

/// Prunes `subgraph` in place, returning the number of vertices
/// removed. A no-op if the subgraph's current `mcd` already satisfies
/// `requirement`; the peel is monotone because each removed vertex's
/// own degree stands in for `mcd` at that point (the key property
/// spec.md documents: using the popped degree as the `mcd` override
/// means the threshold check only ever tightens as the peel proceeds).
#[instrument(skip(subgraph, requirement), fields(index = %subgraph.index, n0 = subgraph.n()))]
pub fn prune(
    subgraph: &mut Realized,
    requirement: &Requirement,
    clusterer: ClustererKind,
    k: Option<u32>,
) -> u64 {
    let initial_mcd = subgraph.mcd();
    let initial_threshold = requirement.threshold(clusterer, subgraph.n(), initial_mcd, k);
    if initial_mcd as f64 > initial_threshold {
        return 0;
    }

    let mut degrees: HashMap<NodeId, u64> = subgraph
        .local_ids()
        .map(|l| (subgraph.original_id(l), subgraph.degree(l)))
        .collect();
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> =
        degrees.iter().map(|(&id, &d)| Reverse((d, id))).collect();

    let mut deleted = 0u64;
    while let Some(Reverse((popped_degree, node))) = heap.pop() {
        let current_degree = match degrees.get(&node) {
            Some(&d) => d,
            None => continue, // already removed
        };
        if popped_degree != current_degree {
            continue; // stale entry, a fresher one is (or was) in the heap
        }

        let threshold = requirement.threshold(clusterer, subgraph.n(), current_degree, k);
        if current_degree as f64 > threshold {
            break;
        }

        for neighbor in subgraph.original_neighbors(node) {
            if let Some(d) = degrees.get_mut(&neighbor) {
                *d -= 1;
                heap.push(Reverse((*d, neighbor)));
            }
        }
        subgraph.remove_original(node);
        degrees.remove(&node);
        deleted += 1;
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store::GraphStore;

    #[test]
    fn clique_is_never_pruned() {
        let g = GraphStore::clique(10);
        let mut h = g.induced_subgraph(&(0..10).collect::<Vec<_>>(), "s".to_string()).unwrap();
        let requirement = Requirement::most_stringent();
        let deleted = prune(&mut h, &requirement, ClustererKind::ModMod, None);
        assert_eq!(deleted, 0);
        assert_eq!(h.n(), 10);
    }

    #[test]
    fn straight_line_is_pruned_to_nothing() {
        let g = GraphStore::path(5);
        let mut h = g.induced_subgraph(&(0..5).collect::<Vec<_>>(), "s".to_string()).unwrap();
        let requirement = Requirement::most_stringent(); // threshold = 2, mcd of a path is 1
        let deleted = prune(&mut h, &requirement, ClustererKind::ModMod, None);
        assert_eq!(deleted, 5);
        assert_eq!(h.n(), 0);
    }

    #[test]
    fn peel_stops_as_soon_as_threshold_is_met() {
        // a triangle with a pendant: pendant has degree 1, triangle has degree 2
        let g = GraphStore::from_edges(&[(0, 1), (1, 2), (2, 0), (0, 3)]);
        let mut h = g.induced_subgraph(&[0, 1, 2, 3], "s".to_string()).unwrap();
        let requirement = Requirement { alpha: 0.0, beta: 0.0, gamma: 0.0, c: 1.0 };
        let deleted = prune(&mut h, &requirement, ClustererKind::ModMod, None);
        assert_eq!(deleted, 1); // only the pendant is removed
        assert_eq!(h.n(), 3);
    }
}
