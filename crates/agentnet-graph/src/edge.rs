use serde::{Deserialize, Serialize};

/// A directed connection between two nodes on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// `e<source>-<target>`, suffixed with `-<n>` for repeated pairs.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    #[serde(default)]
    pub style: EdgeStyle,
}

/// Rendering hints carried with an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub animated: bool,
    pub stroke: String,
    pub stroke_width: u32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            animated: true,
            stroke: "#667eea".to_string(),
            stroke_width: 2,
        }
    }
}

impl Edge {
    pub(crate) fn new(id: String, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            target: target.into(),
            style: EdgeStyle::default(),
        }
    }

    /// Whether this edge touches `node_id` at either end.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Base identity for an edge between `source` and `target`.
pub(crate) fn base_edge_id(source: &str, target: &str) -> String {
    format!("e{}-{}", source, target)
}
