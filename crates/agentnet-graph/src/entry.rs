//! Entry-node detection.
//!
//! A flow starts at a node nobody points at. These are pure functions of a
//! (nodes, edges) snapshot so they can be checked without any session state.

use std::collections::HashSet;

use agentnet_core::error::{AgentNetError, Result};

use crate::edge::Edge;
use crate::node::Node;

/// Nodes that are never the target of an edge, in node order.
pub fn entry_candidates<'a>(nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let targets: HashSet<&str> = edges.iter().map(|e| e.target.as_str()).collect();
    nodes
        .iter()
        .filter(|n| !targets.contains(n.id.as_str()))
        .collect()
}

/// Pick the node a flow run starts from.
///
/// Emptiness is checked first. With several candidates the first one in node
/// order wins; fan-out from multiple entries is not supported.
pub fn find_entry<'a>(nodes: &'a [Node], edges: &[Edge]) -> Result<&'a Node> {
    if nodes.is_empty() {
        return Err(AgentNetError::EmptyGraph);
    }
    entry_candidates(nodes, edges)
        .into_iter()
        .next()
        .ok_or(AgentNetError::NoEntryNode)
}
