use serde::{Deserialize, Serialize};

use agentnet_core::types::{AgentKind, Position};

/// A node on the canvas.
///
/// Each node stands for one agent known to (or pending with) the backend.
/// Only `position` and `selected` change after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier. Backend-assigned once confirmed.
    pub id: String,
    /// Display label.
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: AgentKind,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    /// Create a new node with minimal configuration.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: AgentKind::default(),
            role: None,
            model: None,
            goals: vec![],
            position: Position::default(),
            selected: false,
        }
    }

    pub fn with_kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }

    pub(crate) fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}
