//! Agent commands: turn user intents into backend calls and fold the answers
//! back into the graph and the journal.
//!
//! Every backend call runs on its own task and reports a [`Completion`] on the
//! session's channel. Tasks never touch session state; results are applied by
//! node id, so edits made while a request is in flight are safe.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agentnet_core::error::Result;
use agentnet_core::traits::Backend;
use agentnet_core::types::{
    ConnectRequest, CreateAgentRequest, CreateAgentResponse, SendRequest, SendResponse,
};
use agentnet_graph::GraphStore;

use crate::draft::{AgentForm, AgentFormDraft};
use crate::log::LogStore;
use crate::runner::RunGuard;

/// Result of a backend call, delivered back to the owning session.
#[derive(Debug)]
pub enum Completion {
    AgentCreated {
        pending: PendingAgent,
        result: Result<CreateAgentResponse>,
    },
    EdgeNotified {
        edge_id: String,
        source: String,
        target: String,
        result: Result<()>,
    },
    RunFinished {
        entry_id: String,
        result: Result<SendResponse>,
    },
}

/// An agent submission awaiting the backend's answer.
#[derive(Debug, Clone)]
pub struct PendingAgent {
    pub client_id: String,
    pub draft: AgentFormDraft,
}

pub struct AgentCommandService {
    backend: Arc<dyn Backend>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl AgentCommandService {
    pub fn new(backend: Arc<dyn Backend>, completions: mpsc::UnboundedSender<Completion>) -> Self {
        Self {
            backend,
            completions,
        }
    }

    /// Submit the form's draft. Returns whether a request was issued.
    ///
    /// An incomplete draft, or a submission while another is pending, is
    /// ignored without touching any state.
    pub fn create_agent(&self, form: &mut AgentForm) -> bool {
        if form.is_pending() {
            debug!("Agent submission already pending, ignoring");
            return false;
        }
        let draft = form.draft().clone();
        if !draft.is_submittable() {
            debug!("Agent form missing name or role, ignoring");
            return false;
        }

        let client_id = Uuid::new_v4().to_string();
        let req = CreateAgentRequest {
            id: client_id.clone(),
            name: draft.name.trim().to_string(),
            role: draft.role.trim().to_string(),
            goals: draft.goal_list(),
            model: draft.model.trim().to_string(),
        };
        form.mark_pending();
        info!(client_id = %client_id, name = %req.name, "Creating agent");

        let pending = PendingAgent { client_id, draft };
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.create_agent(req).await;
            Completion::AgentCreated { pending, result }
        });
        true
    }

    /// Apply the answer to a submission. Backend failure still creates the
    /// node, under the client id.
    pub fn finish_create_agent(
        &self,
        pending: PendingAgent,
        result: Result<CreateAgentResponse>,
        graph: &mut GraphStore,
        log: &mut LogStore,
        form: &mut AgentForm,
    ) {
        let name = pending.draft.name.trim().to_string();
        match result {
            Ok(resp) => {
                let id = match resp.agent_id {
                    Some(id) if !graph.contains(&id) => id,
                    Some(id) => {
                        warn!(agent_id = %id, client_id = %pending.client_id, "Backend id already on canvas, keeping client id");
                        pending.client_id.clone()
                    }
                    None => pending.client_id.clone(),
                };
                match graph.add_node(pending.draft.to_node(id.as_str())) {
                    Ok(_) => {
                        info!(node_id = %id, "Agent created");
                        log.append("System", "User", format!("Created agent: {}", name));
                    }
                    Err(e) => warn!(error = %e, "Could not place created agent"),
                }
            }
            Err(e) => {
                warn!(error = %e, client_id = %pending.client_id, "Agent creation failed, creating locally");
                match graph.add_node(pending.draft.to_node(pending.client_id.as_str())) {
                    Ok(_) => {
                        log.append(
                            "System",
                            "User",
                            format!("Backend unavailable, created agent locally: {}", name),
                        );
                    }
                    Err(e) => warn!(error = %e, "Could not place local agent"),
                }
            }
        }
        form.finish_submit();
    }

    /// Add the edge locally, then tell the backend in the background.
    pub fn connect(&self, source: &str, target: &str, graph: &mut GraphStore) -> Result<String> {
        let edge_id = graph.add_edge(source, target)?.id.clone();

        let req = ConnectRequest {
            from: source.to_string(),
            to: target.to_string(),
        };
        let backend = self.backend.clone();
        let (source, target, notify_id) = (source.to_string(), target.to_string(), edge_id.clone());
        self.spawn(async move {
            let result = backend.connect(req).await;
            Completion::EdgeNotified {
                edge_id: notify_id,
                source,
                target,
                result,
            }
        });
        Ok(edge_id)
    }

    /// A failed notification is only traced; the edge stays.
    pub fn finish_connect(
        &self,
        edge_id: &str,
        source: &str,
        target: &str,
        result: Result<()>,
        graph: &GraphStore,
        log: &mut LogStore,
    ) {
        match result {
            Ok(()) => {
                log.append(
                    "System",
                    "User",
                    format!(
                        "Connected: {} → {}",
                        graph.label_of(source),
                        graph.label_of(target)
                    ),
                );
            }
            Err(e) => {
                warn!(edge_id, source, target, error = %e, "Backend connect notification failed");
            }
        }
    }

    /// Issue the run request. The guard reports completion even if the task
    /// dies before the backend answers.
    pub(crate) fn send_run(&self, entry_id: String, req: SendRequest) {
        let backend = self.backend.clone();
        let guard = RunGuard::new(self.completions.clone(), entry_id);
        tokio::spawn(async move {
            let result = backend.send(req).await;
            guard.finish(result);
        });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let completion = task.await;
            // The session may already be gone.
            let _ = tx.send(completion);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentnet_core::types::AgentKind;
    use agentnet_test_utils::{graph_of, Call, MockBackend};

    fn service(backend: Arc<MockBackend>) -> (AgentCommandService, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AgentCommandService::new(backend, tx), rx)
    }

    fn filled_form() -> AgentForm {
        let mut form = AgentForm::new("gpt-4o-mini");
        form.open();
        form.edit(AgentFormDraft {
            name: "Researcher".into(),
            role: "Finds sources".into(),
            goals: "a, b,,  c ".into(),
            model: "gpt-4o-mini".into(),
            kind: AgentKind::LlmAgent,
        });
        form
    }

    #[tokio::test]
    async fn test_create_agent_request_shape() {
        let backend = MockBackend::new().with_agent_id("srv-9").into_arc();
        let (svc, mut rx) = service(backend.clone());
        let mut form = filled_form();

        assert!(svc.create_agent(&mut form));
        assert!(form.is_pending());

        let completion = rx.recv().await.unwrap();
        let creates = backend.creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].goals, vec!["a", "b", "c"]);
        assert_eq!(creates[0].name, "Researcher");

        let mut graph = GraphStore::new();
        let mut log = LogStore::new();
        match completion {
            Completion::AgentCreated { pending, result } => {
                assert_eq!(pending.client_id, creates[0].id);
                svc.finish_create_agent(pending, result, &mut graph, &mut log, &mut form);
            }
            other => panic!("unexpected completion: {other:?}"),
        }
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.nodes()[0].id, "srv-9");
        assert_eq!(log.last().unwrap().message, "Created agent: Researcher");
        assert!(!form.is_open());
        assert!(!form.is_pending());
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_is_ignored() {
        let backend = MockBackend::new().into_arc();
        let (svc, mut rx) = service(backend.clone());
        let mut form = filled_form();

        assert!(svc.create_agent(&mut form));
        assert!(!svc.create_agent(&mut form));
        let _ = rx.recv().await.unwrap();
        assert_eq!(backend.creates().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_id_collision_keeps_client_id() {
        let backend = MockBackend::new().with_agent_id("a").into_arc();
        let (svc, mut rx) = service(backend.clone());
        let mut form = filled_form();
        let mut graph = graph_of(&["a"], &[]);
        let mut log = LogStore::new();

        svc.create_agent(&mut form);
        let Some(Completion::AgentCreated { pending, result }) = rx.recv().await else {
            panic!("expected agent completion");
        };
        let client_id = pending.client_id.clone();
        svc.finish_create_agent(pending, result, &mut graph, &mut log, &mut form);

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.nodes()[1].id, client_id);
    }

    #[tokio::test]
    async fn test_connect_applies_before_backend_answers() {
        let backend = MockBackend::new().failing_connect().into_arc();
        let (svc, mut rx) = service(backend.clone());
        let mut graph = graph_of(&["a", "b"], &[]);
        let mut log = LogStore::new();

        let edge_id = svc.connect("a", "b", &mut graph).unwrap();
        assert_eq!(graph.edges().len(), 1);

        let Some(Completion::EdgeNotified { edge_id: notified, source, target, result }) =
            rx.recv().await
        else {
            panic!("expected edge completion");
        };
        assert_eq!(notified, edge_id);
        assert!(result.is_err());
        svc.finish_connect(&notified, &source, &target, result, &graph, &mut log);

        assert_eq!(graph.edges().len(), 1);
        assert!(log.is_empty());
        assert_eq!(
            backend.calls(),
            vec![Call::Connect(ConnectRequest { from: "a".into(), to: "b".into() })]
        );
    }

    #[tokio::test]
    async fn test_connect_invalid_endpoint_issues_nothing() {
        let backend = MockBackend::new().into_arc();
        let (svc, _rx) = service(backend.clone());
        let mut graph = graph_of(&["a"], &[]);

        assert!(svc.connect("a", "ghost", &mut graph).is_err());
        tokio::task::yield_now().await;
        assert!(backend.calls().is_empty());
        assert!(graph.edges().is_empty());
    }
}
