//! The graph store and subgraph handles (C1, spec §3/§4.1).

pub mod store;
pub mod subgraph;

pub use store::GraphStore;
pub use subgraph::{Intangible, Realized};
