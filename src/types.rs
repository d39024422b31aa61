//! Shared id types and the petgraph aliases used throughout the crate.

/// A vertex id in the global graph `G`. Dense: `G` is built once from
/// `0..n` and never mutated, so this also serves as the compact id.
pub type NodeId = u32;

/// Wrapper for petgraph's undirected graph type, unweighted: node and
/// edge payloads carry no data, only the topology matters here.
pub type UnGraph = petgraph::graph::UnGraph<(), ()>;
