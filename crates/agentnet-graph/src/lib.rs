//! Canvas graph model.
//!
//! A canvas is a directed graph of agent `Node`s connected by `Edge`s. The
//! `GraphStore` owns both sets and is the only place they are mutated; the
//! `entry` module answers where a flow run begins.

pub mod edge;
pub mod entry;
pub mod node;
pub mod store;

pub use edge::{Edge, EdgeStyle};
pub use entry::{entry_candidates, find_entry};
pub use node::Node;
pub use store::{grid_position, GraphStore};
