//! Test doubles for the AgentNet backend.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::Notify;

use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::traits::Backend;
use agentnet_core::types::{
    ConnectRequest, CreateAgentRequest, CreateAgentResponse, FlowMessage, SendRequest,
    SendResponse,
};
use agentnet_graph::{GraphStore, Node};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateAgent(CreateAgentRequest),
    Connect(ConnectRequest),
    Send(SendRequest),
}

/// Scriptable in-memory [`Backend`] that records every call it receives.
///
/// Calls are recorded before any scripted delay, so a held `send` already
/// counts as issued.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    agent_id: Option<String>,
    messages: Option<Vec<FlowMessage>>,
    fail_create: bool,
    fail_connect: bool,
    fail_send: bool,
    send_gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `POST /agent` with this `agent_id`.
    pub fn with_agent_id(mut self, id: impl Into<String>) -> Self {
        self.agent_id = Some(id.into());
        self
    }

    /// Answer `POST /send` with these messages.
    pub fn with_messages(mut self, messages: Vec<FlowMessage>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    /// Make every `send` wait for a permit on `gate` before answering.
    pub fn with_send_gate(mut self, gate: Arc<Notify>) -> Self {
        self.send_gate = Some(gate);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<CreateAgentRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateAgent(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> Vec<ConnectRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Connect(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> Vec<SendRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn unavailable() -> AgentNetError {
        AgentNetError::Backend("connection refused".into())
    }
}

impl Backend for MockBackend {
    fn create_agent(&self, req: CreateAgentRequest) -> BoxFuture<'_, Result<CreateAgentResponse>> {
        self.record(Call::CreateAgent(req));
        Box::pin(async move {
            if self.fail_create {
                return Err(Self::unavailable());
            }
            Ok(CreateAgentResponse {
                agent_id: self.agent_id.clone(),
            })
        })
    }

    fn connect(&self, req: ConnectRequest) -> BoxFuture<'_, Result<()>> {
        self.record(Call::Connect(req));
        Box::pin(async move {
            if self.fail_connect {
                return Err(AgentNetError::BackendStatus {
                    status: 500,
                    body: "internal error".into(),
                });
            }
            Ok(())
        })
    }

    fn send(&self, req: SendRequest) -> BoxFuture<'_, Result<SendResponse>> {
        self.record(Call::Send(req));
        Box::pin(async move {
            if let Some(gate) = &self.send_gate {
                gate.notified().await;
            }
            if self.fail_send {
                return Err(Self::unavailable());
            }
            Ok(SendResponse {
                messages: self.messages.clone(),
            })
        })
    }
}

/// Graph with nodes `ids` (labels upper-cased) and the given edges.
pub fn graph_of(ids: &[&str], edges: &[(&str, &str)]) -> GraphStore {
    let mut graph = GraphStore::new();
    for id in ids {
        graph
            .add_node(Node::new(*id, id.to_uppercase()))
            .expect("unique test ids");
    }
    for (source, target) in edges {
        graph.add_edge(source, target).expect("known endpoints");
    }
    graph
}
