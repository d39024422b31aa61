//! The refinement engine (C6): algorithm-G itself. A LIFO worklist of
//! intangible clusters, each realized, pruned, cut-checked and either
//! accepted or split, with every step recorded in the hierarchy tree.
//!
//! [from original: `hm01/cm.py`'s `algorithm_g`.]

use hashbrown::HashMap;
use tracing::{debug, info, instrument};

use crate::clusterer::{Clusterer, ClustererKind};
use crate::config::Context;
use crate::error::Result;
use crate::graph::{GraphStore, Intangible};
use crate::oracle;
use crate::pruner;
use crate::requirement::Requirement;
use crate::tree::Tree;
use crate::types::NodeId;

/// Drops a cluster from further splitting before it is even realized,
/// the two size/shape-based filters spec.md §3/§8 call out.
#[derive(Debug, Clone, Copy)]
pub struct ClusterIgnoreFilter {
    pub ignore_trees: bool,
    pub ignore_smaller_than: usize,
}

impl ClusterIgnoreFilter {
    pub fn none() -> ClusterIgnoreFilter {
        ClusterIgnoreFilter { ignore_trees: false, ignore_smaller_than: 0 }
    }

    fn should_ignore(&self, cluster: &Intangible, graph: &GraphStore) -> bool {
        if self.ignore_trees && cluster.is_tree_like(graph) {
            return true;
        }
        if self.ignore_smaller_than > 0 && cluster.n() < self.ignore_smaller_than {
            return true;
        }
        false
    }
}

/// Runs algorithm-G to completion: `graphs` is the initial clustering
/// (from the first clustering round or `--existing-clustering`).
/// Returns the final set of accepted clusters, a flat node→cluster-id
/// membership map for the `node cluster_id` output file, and the
/// hierarchy tree for the `.tree.json` output file.
#[instrument(skip(graph, graphs, clusterer, requirement, filter, ctx), fields(n0 = graphs.len()))]
pub fn algorithm_g(
    graph: &GraphStore,
    graphs: Vec<Intangible>,
    clusterer: &Clusterer,
    requirement: &Requirement,
    filter: &ClusterIgnoreFilter,
    ctx: &Context,
) -> Result<(Vec<Intangible>, HashMap<NodeId, String>, Tree)> {
    let mut tree = Tree::new(String::new(), graph.n());
    for g in &graphs {
        tree.add_child("", g.index.clone(), g.n())?;
    }

    let mut stack: Vec<Intangible> = graphs;
    info!(queue_size = stack.len(), "starting algorithm-g");
    let mut ans: Vec<Intangible> = Vec::new();
    let mut node2cids: HashMap<NodeId, String> = HashMap::new();

    while let Some(intangible) = stack.pop() {
        debug!(queue_size = stack.len(), "entered next iteration of loop");
        update_cid_membership(intangible.nodes(), &intangible.index, &mut node2cids);

        if intangible.n() <= 1 {
            continue;
        }
        if filter.should_ignore(&intangible, graph) {
            debug!(graph_index = %intangible.index, "filtered graph");
            tree.set_extant(&intangible.index, true)?;
            ans.push(intangible);
            continue;
        }

        let mut subgraph = intangible.realize(graph)?;
        let mut tree_label = subgraph.index.clone();
        let original_mcd = subgraph.mcd();
        let num_pruned = pruner::prune(&mut subgraph, requirement, clusterer.kind(), clusterer.k());
        if num_pruned > 0 {
            tree.set_cut_size(&tree_label, original_mcd)?;
            info!(num_pruned, "pruned graph");
            let new_index = format!("{tree_label}\u{3b4}"); // trailing lowercase delta
            subgraph.index = new_index.clone();
            tree.add_child(&tree_label, new_index.clone(), subgraph.n())?;
            tree_label = new_index;
            update_cid_membership(
                subgraph.local_ids().map(|l| subgraph.original_id(l)),
                &subgraph.index,
                &mut node2cids,
            );
        }

        let mincut_res = oracle::run(ctx, &subgraph)?;
        let valid_threshold =
            requirement.threshold(clusterer.kind(), subgraph.n(), subgraph.mcd(), clusterer.k());
        debug!(valid_threshold, "calculated validity threshold");
        debug!(
            a_side = mincut_res.light_partition.len(),
            b_side = mincut_res.heavy_partition.len(),
            cut_size = mincut_res.cut_size,
            "mincut computed"
        );
        tree.set_cut_size(&tree_label, mincut_res.cut_size)?;
        tree.set_validity_threshold(&tree_label, valid_threshold)?;

        if mincut_res.cut_size > 0 && (mincut_res.cut_size as f64) <= valid_threshold {
            let p1 = Intangible::new(mincut_res.light_partition, format!("{tree_label}a"))?;
            let p2 = Intangible::new(mincut_res.heavy_partition, format!("{tree_label}b"))?;
            tree.add_child(&tree_label, p1.index.clone(), p1.n())?;
            tree.add_child(&tree_label, p2.index.clone(), p2.n())?;

            let realized_p1 = p1.realize(graph)?;
            let realized_p2 = p2.realize(graph)?;
            let subp1 = clusterer.cluster_without_singletons(ctx, &realized_p1)?;
            let subp2 = clusterer.cluster_without_singletons(ctx, &realized_p2)?;
            for sg in &subp1 {
                tree.add_child(&p1.index, sg.index.clone(), sg.n())?;
            }
            for sg in &subp2 {
                tree.add_child(&p2.index, sg.index.clone(), sg.n())?;
            }
            info!(
                num_a_side = subp1.len(),
                num_b_side = subp2.len(),
                "cluster split"
            );
            stack.extend(subp1);
            stack.extend(subp2);
        } else {
            let candidate = subgraph.to_intangible();
            let modularity = graph.modularity_of(&candidate);
            if clusterer.kind() != ClustererKind::Ikc || modularity > 0.0 {
                tree.set_extant(&tree_label, true)?;
                info!("cut valid, not splitting anymore");
                ans.push(candidate);
            } else {
                tree.set_extant(&tree_label, false)?;
                info!(modularity, "cut valid, but modularity non-positive, thrown away");
            }
        }
    }
    Ok((ans, node2cids, tree))
}

fn update_cid_membership(
    nodes: impl Iterator<Item = NodeId>,
    index: &str,
    node2cids: &mut HashMap<NodeId, String>,
) {
    for n in nodes {
        node2cids.insert(n, index.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clusterer::Clusterer;
    use crate::requirement::Requirement;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn no_op_context(dir: &std::path::Path) -> Context {
        Context {
            working_dir: dir.to_path_buf(),
            transient: false,
            oracle_path: PathBuf::from("/bin/false"),
            modcpm_path: PathBuf::from("/bin/false"),
            ikc_path: PathBuf::from("/bin/false"),
        }
    }

    fn write_executable(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(path, perms).unwrap();
        }
    }

    /// A fake cactus-mincut oracle: bisects its input in half by local
    /// id (first half light, second half heavy) and always reports a
    /// cut of 1, except on an empty graph, where it reports a cut of 0.
    /// Good enough to drive the split branch without a real oracle.
    fn write_bisecting_oracle(path: &Path) {
        write_executable(
            path,
            "#!/bin/sh\n\
             out=\"$4\"\n\
             metis=\"$5\"\n\
             n=$(head -n1 \"$metis\" | awk '{print $1}')\n\
             : > \"$out\"\n\
             if [ \"$n\" -eq 0 ]; then echo 'cut=0'; exit 0; fi\n\
             half=$((n / 2))\n\
             i=0\n\
             while [ \"$i\" -lt \"$n\" ]; do\n\
             \tif [ \"$i\" -lt \"$half\" ]; then echo 0 >> \"$out\"; else echo 1 >> \"$out\"; fi\n\
             \ti=$((i+1))\n\
             done\n\
             echo 'cut=1'\n",
        );
    }

    /// A fake modularity clusterer: assigns every node in its input to
    /// a single cluster 0.
    fn write_single_cluster_clusterer(path: &Path) {
        write_executable(
            path,
            "#!/bin/sh\n\
             input=\"\"\n\
             output=\"\"\n\
             while [ $# -gt 0 ]; do\n\
             \tcase \"$1\" in\n\
             \t--input) input=\"$2\"; shift 2 ;;\n\
             \t--output) output=\"$2\"; shift 2 ;;\n\
             \t--resolution) shift 2 ;;\n\
             \t*) shift ;;\n\
             \tesac\n\
             done\n\
             awk -F'\\t' '{print $1\"\\n\"$2}' \"$input\" | sort -n -u | awk '{print $0\",0\"}' > \"$output\"\n",
        );
    }

    #[test]
    fn two_disjoint_cliques_stay_unsplit_once_already_separated() {
        // two triangles, no bridge between them: each is its own
        // cluster, fully connected, and should come out unsplit (the
        // missing oracle degrades to a zero-cut result, which is > 0
        // required false, so no split is even attempted... this test
        // exercises the filtered-out-as-too-small path instead, which
        // needs no subprocess at all).
        let g = GraphStore::from_edges(&[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let dir = tempfile::tempdir().unwrap();
        let ctx = no_op_context(dir.path());
        let clusterer = Clusterer::ModMod { tool_path: PathBuf::from("/bin/false") };
        let requirement = Requirement::most_stringent();
        let filter = ClusterIgnoreFilter { ignore_trees: false, ignore_smaller_than: 10 };
        let initial = vec![
            Intangible::new(vec![0, 1, 2], "a".to_string()).unwrap(),
            Intangible::new(vec![3, 4, 5], "b".to_string()).unwrap(),
        ];
        let (ans, node2cids, _tree) =
            algorithm_g(&g, initial, &clusterer, &requirement, &filter, &ctx).unwrap();
        assert_eq!(ans.len(), 2);
        assert_eq!(node2cids.len(), 6);
    }

    #[test]
    fn a_real_cut_splits_and_reclusters_both_sides() {
        // two triangles joined by a single bridge edge (2-3): a real
        // mincut of size 1 separates them, so algorithm-g should split
        // rather than accept, then recluster and filter each resulting
        // triangle back into the output.
        let g = GraphStore::from_edges(&[
            (0, 1),
            (1, 2),
            (2, 0),
            (3, 4),
            (4, 5),
            (5, 3),
            (2, 3),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = no_op_context(dir.path());
        let oracle_path = dir.path().join("oracle.sh");
        write_bisecting_oracle(&oracle_path);
        let clusterer_path = dir.path().join("modmod.sh");
        write_single_cluster_clusterer(&clusterer_path);
        ctx.oracle_path = oracle_path;

        let clusterer = Clusterer::ModMod { tool_path: clusterer_path };
        let requirement = Requirement { alpha: 0.0, beta: 0.0, gamma: 0.0, c: 1.0 };
        let filter = ClusterIgnoreFilter { ignore_trees: false, ignore_smaller_than: 4 };
        let initial = vec![Intangible::new((0..6).collect(), "x".to_string()).unwrap()];

        let (ans, node2cids, tree) =
            algorithm_g(&g, initial, &clusterer, &requirement, &filter, &ctx).unwrap();

        assert_eq!(ans.len(), 2);
        assert_eq!(node2cids.len(), 6);
        assert_eq!(node2cids[&0], node2cids[&1]);
        assert_eq!(node2cids[&1], node2cids[&2]);
        assert_eq!(node2cids[&3], node2cids[&4]);
        assert_eq!(node2cids[&4], node2cids[&5]);
        assert_ne!(node2cids[&0], node2cids[&3]);

        // every accepted cluster's tree node must be extant (spec's
        // hierarchy-completeness property), and nothing else should be.
        let json = tree.to_json().unwrap();
        assert_eq!(json.matches("\"extant\": true").count(), ans.len());
    }

    #[test]
    fn fully_pruned_cluster_gets_a_delta_suffix_and_is_still_recorded() {
        // a 5-vertex path under the most stringent requirement: every
        // vertex gets peeled away (see pruner::tests::
        // straight_line_is_pruned_to_nothing), so the engine must
        // rename the subgraph with a trailing delta, record the
        // pre-prune mcd on the original tree node, and carry on with
        // an empty subgraph rather than failing.
        let g = GraphStore::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = no_op_context(dir.path());
        let oracle_path = dir.path().join("oracle.sh");
        write_bisecting_oracle(&oracle_path);
        ctx.oracle_path = oracle_path;

        let clusterer = Clusterer::ModMod { tool_path: PathBuf::from("/bin/false") };
        let requirement = Requirement::most_stringent();
        let filter = ClusterIgnoreFilter::none();
        let initial = vec![Intangible::new((0..5).collect(), "x".to_string()).unwrap()];

        let (ans, node2cids, tree) =
            algorithm_g(&g, initial, &clusterer, &requirement, &filter, &ctx).unwrap();

        assert_eq!(ans.len(), 1);
        assert_eq!(ans[0].index, "x\u{3b4}");
        assert_eq!(ans[0].n(), 0);
        assert_eq!(node2cids.len(), 5);

        let json = tree.to_json().unwrap();
        assert!(json.contains("x\u{3b4}"));
        assert_eq!(json.matches("\"extant\": true").count(), 1);
    }
}
