use tracing::debug;

use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::types::{AgentKind, Position};

use crate::edge::{base_edge_id, Edge};
use crate::entry;
use crate::node::Node;

const GRID_COLUMNS: usize = 3;
const GRID_ORIGIN: Position = Position { x: 100.0, y: 100.0 };
const GRID_STEP_X: f64 = 250.0;
const GRID_STEP_Y: f64 = 150.0;

/// Default placement for the `index`-th node: three columns, rows below.
pub fn grid_position(index: usize) -> Position {
    let column = (index % GRID_COLUMNS) as f64;
    let row = (index / GRID_COLUMNS) as f64;
    Position::new(
        GRID_ORIGIN.x + GRID_STEP_X * column,
        GRID_ORIGIN.y + GRID_STEP_Y * row,
    )
}

/// Authoritative node and edge set of one canvas.
///
/// Both collections keep insertion order, which is also display order and the
/// tie-break order for entry-node detection.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter graph: input, processor, output, chained.
    pub fn demo() -> Self {
        let mut store = Self::new();
        let seed = [
            Node::new("1", "User Input").with_kind(AgentKind::Input),
            Node::new("2", "AI Processor").with_kind(AgentKind::LlmAgent),
            Node::new("3", "Response").with_kind(AgentKind::Output),
        ];
        for node in seed {
            // Ids are distinct literals.
            let _ = store.add_node(node);
        }
        let _ = store.add_edge("1", "2");
        let _ = store.add_edge("2", "3");
        store
    }

    /// Insert a node at its default grid position.
    pub fn add_node(&mut self, node: Node) -> Result<&Node> {
        if self.contains(&node.id) {
            return Err(AgentNetError::DuplicateNode(node.id));
        }
        let node = node.at(grid_position(self.nodes.len()));
        debug!(node_id = %node.id, label = %node.label, "Node added");
        self.nodes.push(node);
        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Connect two existing nodes. Repeated pairs are kept as separate edges.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<&Edge> {
        if !self.contains(source) || !self.contains(target) {
            return Err(AgentNetError::InvalidEdge {
                source_id: source.to_string(),
                target_id: target.to_string(),
            });
        }
        let id = self.next_edge_id(source, target);
        debug!(edge_id = %id, source, target, "Edge added");
        self.edges.push(Edge::new(id, source, target));
        Ok(&self.edges[self.edges.len() - 1])
    }

    pub fn apply_node_position_change(&mut self, id: &str, position: Position) -> Result<()> {
        let node = self.node_mut(id)?;
        node.position = position;
        Ok(())
    }

    pub fn apply_selection_change(&mut self, id: &str, selected: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        node.selected = selected;
        Ok(())
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AgentNetError::NodeNotFound(id.to_string()))?;
        self.edges.retain(|e| !e.touches(id));
        Ok(self.nodes.remove(index))
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AgentNetError::EdgeNotFound(id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Display label for `id`, falling back to the id itself.
    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map(|n| n.label.as_str()).unwrap_or(id)
    }

    /// First selected node, in display order.
    pub fn selected(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry_candidates(&self) -> Vec<&Node> {
        entry::entry_candidates(&self.nodes, &self.edges)
    }

    pub fn entry_node(&self) -> Result<&Node> {
        entry::find_entry(&self.nodes, &self.edges)
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AgentNetError::NodeNotFound(id.to_string()))
    }

    fn next_edge_id(&self, source: &str, target: &str) -> String {
        let base = base_edge_id(source, target);
        let taken = |id: &str| self.edges.iter().any(|e| e.id == id);
        if !taken(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|id| !taken(id))
            .unwrap_or(base)
    }
}
