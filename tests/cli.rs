//! End-to-end CLI scenarios (spec §8), in the pack's CLI-test style: a
//! throwaway directory holding a config, a graph, and shim external
//! tools, with the real binary then invoked against them.

use std::fs;
use std::path::Path;
use std::process::Command;

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

/// A cactus-mincut oracle shim that always reports a zero cut (every
/// vertex lands on the light side), so the engine never attempts a
/// split and this test can exercise the rest of the pipeline without
/// a real mincut implementation.
fn write_no_op_oracle(path: &Path) {
    write_executable(
        path,
        "#!/bin/sh\n\
         out=\"$4\"\n\
         n=$(head -n1 \"$5\" | cut -d' ' -f1)\n\
         : > \"$out\"\n\
         i=0\n\
         while [ \"$i\" -lt \"$n\" ]; do echo 0 >> \"$out\"; i=$((i+1)); done\n\
         echo 'cut=0'\n",
    );
}

#[test]
fn two_clique_toy_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    let graph_path = dir.path().join("graph.tsv");
    fs::write(&graph_path, "0\t1\n1\t2\n2\t0\n3\t4\n4\t5\n5\t3\n").unwrap();

    let oracle_path = dir.path().join("oracle.sh");
    write_no_op_oracle(&oracle_path);

    let config_path = dir.path().join("refiner.toml");
    fs::write(
        &config_path,
        format!(
            "[tools]\noracle_path = \"{o}\"\nmodcpm_path = \"{o}\"\nikc_path = \"{o}\"\n",
            o = oracle_path.display()
        ),
    )
    .unwrap();

    let existing_clustering = dir.path().join("clusters.txt");
    fs::write(&existing_clustering, "0 a\n1 a\n2 a\n3 b\n4 b\n5 b\n").unwrap();

    let output_path = dir.path().join("out.txt");
    let working_dir = dir.path().join("work");

    let status = Command::new(env!("CARGO_BIN_EXE_connectivity-refiner"))
        .args([
            "--input",
            graph_path.to_str().unwrap(),
            "--clusterer",
            "modmod",
            "--existing-clustering",
            existing_clustering.to_str().unwrap(),
            "--threshold",
            "1",
            "--output",
            output_path.to_str().unwrap(),
            "--working-dir",
            working_dir.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ])
        .status()
        .unwrap();

    assert!(status.success());

    let membership = fs::read_to_string(&output_path).unwrap();
    assert_eq!(membership.lines().count(), 6);
    for line in membership.lines() {
        let mut parts = line.split_whitespace();
        parts.next().unwrap().parse::<u32>().expect("node id column");
        assert!(parts.next().is_some(), "cluster id column");
    }

    let tree_path = dir.path().join("out.txt.tree.json");
    assert!(tree_path.exists());
    let tree_json = fs::read_to_string(&tree_path).unwrap();
    assert!(tree_json.contains("\"label\""));
}

#[test]
fn ikc_without_k_exits_with_input_validation_code() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("refiner.toml");
    fs::write(
        &config_path,
        "[tools]\noracle_path = \"oracle\"\nmodcpm_path = \"modcpm\"\nikc_path = \"ikc\"\n",
    )
    .unwrap();

    let graph_path = dir.path().join("graph.tsv");
    fs::write(&graph_path, "0\t1\n").unwrap();

    let output_path = dir.path().join("out.txt");
    let working_dir = dir.path().join("work");

    let output = Command::new(env!("CARGO_BIN_EXE_connectivity-refiner"))
        .args([
            "--input",
            graph_path.to_str().unwrap(),
            "--clusterer",
            "ikc",
            "--threshold",
            "1k",
            "--output",
            output_path.to_str().unwrap(),
            "--working-dir",
            working_dir.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
}
