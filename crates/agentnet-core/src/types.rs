use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of agent a node represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "Input")]
    Input,
    #[serde(rename = "LLM Agent")]
    LlmAgent,
    #[serde(rename = "Output")]
    Output,
    /// Unclassified.
    #[default]
    #[serde(rename = "Agent")]
    Agent,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::LlmAgent => "LLM Agent",
            Self::Output => "Output",
            Self::Agent => "Agent",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = std::convert::Infallible;

    /// Anything unrecognised maps to the unclassified kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "input" => Self::Input,
            "llm agent" | "llm" | "llm_agent" => Self::LlmAgent,
            "output" => Self::Output,
            _ => Self::Agent,
        };
        Ok(kind)
    }
}

/// Canvas position. Purely presentational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Body of `POST /agent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub id: String,
    pub name: String,
    pub role: String,
    pub goals: Vec<String>,
    pub model: String,
}

/// Response of `POST /agent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentResponse {
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Body of `POST /connect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub from: String,
    pub to: String,
}

/// Body of `POST /send`, also the outbound push-channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub sender: String,
    pub message: String,
}

/// One message produced by a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMessage {
    pub target: String,
    pub reply: String,
}

/// Response of `POST /send`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messages: Option<Vec<FlowMessage>>,
}

impl SendResponse {
    pub fn messages(&self) -> &[FlowMessage] {
        self.messages.as_deref().unwrap_or_default()
    }
}

/// A frame pushed by the backend: one transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    pub from: String,
    pub to: String,
    pub message: String,
}

/// What the push-channel subscription delivers to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// The socket was established.
    Connected,
    /// A well-formed inbound frame.
    Frame(PushFrame),
    /// Transport failure. The subscription is over.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_wire_names() {
        let json = serde_json::to_string(&AgentKind::LlmAgent).unwrap();
        assert_eq!(json, "\"LLM Agent\"");
        let kind: AgentKind = serde_json::from_str("\"Output\"").unwrap();
        assert_eq!(kind, AgentKind::Output);
    }

    #[test]
    fn test_agent_kind_from_str_defaults_to_agent() {
        assert_eq!("input".parse::<AgentKind>().unwrap(), AgentKind::Input);
        assert_eq!("LLM Agent".parse::<AgentKind>().unwrap(), AgentKind::LlmAgent);
        assert_eq!("planner".parse::<AgentKind>().unwrap(), AgentKind::Agent);
        assert_eq!("".parse::<AgentKind>().unwrap(), AgentKind::Agent);
    }

    #[test]
    fn test_create_agent_response_without_id() {
        let resp: CreateAgentResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.agent_id.is_none());
        let resp: CreateAgentResponse = serde_json::from_str(r#"{"agent_id":"abc"}"#).unwrap();
        assert_eq!(resp.agent_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_send_response_messages_optional() {
        let resp: SendResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.messages().is_empty());
        let resp: SendResponse =
            serde_json::from_str(r#"{"messages":[{"target":"2","reply":"hi"}]}"#).unwrap();
        assert_eq!(resp.messages().len(), 1);
        assert_eq!(resp.messages()[0].reply, "hi");
    }

    #[test]
    fn test_connect_request_uses_from_to_keys() {
        let body = serde_json::to_value(ConnectRequest { from: "a".into(), to: "b".into() }).unwrap();
        assert_eq!(body, serde_json::json!({"from": "a", "to": "b"}));
    }
}
