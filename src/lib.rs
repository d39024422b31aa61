#![warn(missing_docs)]

//! # connectivity-refiner
//!
//! Recursive connectivity-based refinement of graph clusterings: given
//! an initial clustering, recursively bisects every cluster that fails
//! a minimum-cut connectivity bar until each emitted cluster clears it
//! (or is too small/shaped to usefully split further).
//!
//! Built on [`petgraph`](https://docs.rs/petgraph) for the graph store
//! and adjacency; mincut and community-detection are external tools
//! invoked as subprocesses, not reimplemented here.

pub mod cli;
pub mod clusterer;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod io;
pub mod oracle;
pub mod pruner;
pub mod requirement;
pub mod tree;
pub mod types;

pub use error::{RefinerError, Result};
pub use graph::GraphStore;
