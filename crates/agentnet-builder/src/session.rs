use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use agentnet_core::config::BuilderConfig;
use agentnet_core::error::Result;
use agentnet_core::event::{BuilderEvent, EventBus};
use agentnet_core::traits::Backend;
use agentnet_core::types::{Position, PushEvent};
use agentnet_graph::GraphStore;

use crate::commands::{AgentCommandService, Completion};
use crate::draft::{AgentForm, AgentFormDraft};
use crate::log::LogStore;
use crate::runner::{FlowRunner, RunSession};

/// Something the user asked the builder to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    OpenAgentForm,
    EditAgentForm(AgentFormDraft),
    SubmitAgentForm,
    CancelAgentForm,
    Connect { source: String, target: String },
    MoveNode { id: String, position: Position },
    SelectNode { id: String, selected: bool },
    RemoveNode { id: String },
    RemoveEdge { id: String },
    RunFlow,
}

/// One builder view: the canvas, its journal, the agent form and the run
/// state.
///
/// All mutation goes through `dispatch`, `apply` and `apply_push`, called by
/// the single task that owns the session.
pub struct BuilderSession {
    graph: GraphStore,
    log: LogStore,
    form: AgentForm,
    commands: AgentCommandService,
    runner: FlowRunner,
    completions: mpsc::UnboundedReceiver<Completion>,
    bus: EventBus,
}

impl BuilderSession {
    pub fn new(config: &BuilderConfig, backend: Arc<dyn Backend>, bus: EventBus) -> Self {
        let (tx, completions) = mpsc::unbounded_channel();
        let mut log = LogStore::with_bus(bus.clone());
        let graph = if config.seed_demo {
            log.append("System", "User", "Welcome to AI Agent Network Builder!");
            log.append(
                "System",
                "User",
                "Connect to backend to see live agent communications.",
            );
            GraphStore::demo()
        } else {
            GraphStore::new()
        };

        Self {
            graph,
            log,
            form: AgentForm::new(config.default_model.clone()),
            commands: AgentCommandService::new(backend, tx),
            runner: FlowRunner::new(),
            completions,
            bus,
        }
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn log(&self) -> &LogStore {
        &self.log
    }

    pub fn form(&self) -> &AgentForm {
        &self.form
    }

    pub fn run_session(&self) -> &RunSession {
        self.runner.session()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Handle a user intent. Rejected intents are traced and otherwise
    /// ignored; nothing is surfaced to the caller.
    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::OpenAgentForm => {
                self.form.open();
                self.form_changed();
            }
            Intent::EditAgentForm(draft) => {
                self.form.edit(draft);
                self.form_changed();
            }
            Intent::SubmitAgentForm => {
                self.submit_agent();
            }
            Intent::CancelAgentForm => {
                self.form.cancel();
                self.form_changed();
            }
            Intent::Connect { source, target } => {
                if let Err(e) = self.connect(&source, &target) {
                    debug!(error = %e, "Connect ignored");
                }
            }
            Intent::MoveNode { id, position } => {
                match self.graph.apply_node_position_change(&id, position) {
                    Ok(()) => self.graph_changed(),
                    Err(e) => debug!(error = %e, "Move ignored"),
                }
            }
            Intent::SelectNode { id, selected } => {
                match self.graph.apply_selection_change(&id, selected) {
                    Ok(()) => self.graph_changed(),
                    Err(e) => debug!(error = %e, "Selection ignored"),
                }
            }
            Intent::RemoveNode { id } => match self.graph.remove_node(&id) {
                Ok(_) => self.graph_changed(),
                Err(e) => debug!(error = %e, "Remove ignored"),
            },
            Intent::RemoveEdge { id } => match self.graph.remove_edge(&id) {
                Ok(_) => self.graph_changed(),
                Err(e) => debug!(error = %e, "Remove ignored"),
            },
            Intent::RunFlow => {
                if let Err(e) = self.run_flow() {
                    debug!(error = %e, "Run not started");
                }
            }
        }
    }

    /// Submit the agent form. Returns whether a request was issued.
    pub fn submit_agent(&mut self) -> bool {
        self.commands.create_agent(&mut self.form)
    }

    /// Connect two nodes locally and notify the backend. Returns the edge id.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<String> {
        let edge_id = self.commands.connect(source, target, &mut self.graph)?;
        self.graph_changed();
        Ok(edge_id)
    }

    pub fn run_flow(&mut self) -> Result<()> {
        self.runner
            .start(&self.graph, &mut self.log, &self.commands)?;
        self.bus.publish(BuilderEvent::RunStateChanged { in_flight: true });
        Ok(())
    }

    /// Wait for the next backend completion.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// Completion already waiting, if any.
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Wait for one completion and apply it.
    pub async fn settle(&mut self) -> bool {
        match self.next_completion().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::AgentCreated { pending, result } => {
                self.commands.finish_create_agent(
                    pending,
                    result,
                    &mut self.graph,
                    &mut self.log,
                    &mut self.form,
                );
                self.graph_changed();
                self.form_changed();
            }
            Completion::EdgeNotified {
                edge_id,
                source,
                target,
                result,
            } => {
                self.commands.finish_connect(
                    &edge_id,
                    &source,
                    &target,
                    result,
                    &self.graph,
                    &mut self.log,
                );
            }
            Completion::RunFinished { entry_id, result } => {
                self.runner
                    .finish(&entry_id, result, &self.graph, &mut self.log);
                self.bus.publish(BuilderEvent::RunStateChanged { in_flight: false });
            }
        }
    }

    /// Fold a push-channel event into the journal.
    pub fn apply_push(&mut self, event: PushEvent) {
        match event {
            PushEvent::Connected => {
                self.log.append("System", "Client", "Connected to backend!");
            }
            PushEvent::Frame(frame) => {
                self.log.append(frame.from, frame.to, frame.message);
            }
            PushEvent::Error(error) => {
                warn!(error = %error, "Push channel error");
                self.log.append("System", "Client", "WebSocket connection error");
            }
        }
    }

    fn graph_changed(&self) {
        self.bus.publish(BuilderEvent::GraphChanged);
    }

    fn form_changed(&self) {
        self.bus.publish(BuilderEvent::FormChanged {
            open: self.form.is_open(),
        });
    }
}
