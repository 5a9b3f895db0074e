use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, warn};

use agentnet_builder::{BuilderSession, Completion, Intent};
use agentnet_client::ConnectionClient;
use agentnet_core::event::BuilderEvent;
use agentnet_core::types::{PushEvent, SendRequest};

use crate::event::{EventLoop, TuiEvent};
use crate::input::{Command, InputAction, InputHandler};
use crate::ui;

/// State of the push channel as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    Connecting,
    Connected,
    Offline,
}

/// Application state.
pub struct App {
    pub session: BuilderSession,
    pub input: InputHandler,
    pub push: PushStatus,
    /// One-line feedback for the last command, cleared on the next one.
    pub notice: Option<String>,
    pub scroll_offset: usize,
    pub tick_count: usize,
}

impl App {
    pub fn new(session: BuilderSession, push_enabled: bool) -> Self {
        Self {
            session,
            input: InputHandler::new(),
            push: if push_enabled {
                PushStatus::Connecting
            } else {
                PushStatus::Offline
            },
            notice: None,
            scroll_offset: 0,
            tick_count: 0,
        }
    }

    /// Builder intents for a command. Plain text and quit have none.
    pub fn intents_for(&self, command: &Command) -> Vec<Intent> {
        let graph = self.session.graph();
        match command {
            Command::Agent(draft) => {
                let mut draft = draft.clone();
                if draft.model.trim().is_empty() {
                    draft.model = self.session.form().draft().model.clone();
                }
                vec![
                    Intent::OpenAgentForm,
                    Intent::EditAgentForm(draft),
                    Intent::SubmitAgentForm,
                ]
            }
            Command::Cancel => vec![Intent::CancelAgentForm],
            Command::Connect { source, target } => vec![Intent::Connect {
                source: source.clone(),
                target: target.clone(),
            }],
            Command::Move { id, position } => vec![Intent::MoveNode {
                id: id.clone(),
                position: *position,
            }],
            Command::Select(id) if !graph.contains(id) => Vec::new(),
            Command::Select(id) => {
                let mut intents: Vec<Intent> = graph
                    .nodes()
                    .iter()
                    .filter(|n| n.selected && n.id != *id)
                    .map(|n| Intent::SelectNode {
                        id: n.id.clone(),
                        selected: false,
                    })
                    .collect();
                intents.push(Intent::SelectNode {
                    id: id.clone(),
                    selected: true,
                });
                intents
            }
            Command::Remove(id) if graph.contains(id) => vec![Intent::RemoveNode { id: id.clone() }],
            Command::Remove(id) => vec![Intent::RemoveEdge { id: id.clone() }],
            Command::Run => vec![Intent::RunFlow],
            Command::Quit | Command::Say(_) => Vec::new(),
        }
    }

    /// Apply a command to the session. Plain text comes back as the frame to
    /// push, sent from the selected node.
    pub fn apply_command(&mut self, command: Command) -> Option<SendRequest> {
        self.notice = None;
        match &command {
            Command::Say(text) => {
                let Some(sender) = self.session.graph().selected() else {
                    self.notice = Some("Select a node to send from (/select ID)".to_string());
                    return None;
                };
                return Some(SendRequest {
                    sender: sender.id.clone(),
                    message: text.clone(),
                });
            }
            Command::Run if self.session.run_session().in_flight => {
                self.notice = Some("A flow is already running".to_string());
            }
            Command::Connect { source, target } => {
                let graph = self.session.graph();
                if let Some(missing) = [source, target].into_iter().find(|id| !graph.contains(id)) {
                    self.notice = Some(format!("No node with id {}", missing));
                }
            }
            Command::Select(id) if !self.session.graph().contains(id) => {
                self.notice = Some(format!("No node with id {}", id));
            }
            Command::Agent(draft) if !draft.is_submittable() => {
                self.notice = Some("An agent needs a name and a role".to_string());
            }
            _ => {}
        }

        for intent in self.intents_for(&command) {
            self.session.dispatch(intent);
        }
        None
    }

    /// Scroll the transcript back, never past its first entry.
    pub fn scroll_up(&mut self) {
        let max = self.session.log().len();
        self.scroll_offset = self.scroll_offset.saturating_add(3).min(max);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    pub fn handle_builder_event(&mut self, event: BuilderEvent) {
        match event {
            BuilderEvent::LogAppended { .. } => {
                self.scroll_offset = 0;
            }
            BuilderEvent::GraphChanged
            | BuilderEvent::RunStateChanged { .. }
            | BuilderEvent::FormChanged { .. } => {}
        }
    }

    pub fn handle_push(&mut self, event: PushEvent) {
        match &event {
            PushEvent::Connected => self.push = PushStatus::Connected,
            PushEvent::Error(_) => self.push = PushStatus::Offline,
            PushEvent::Frame(_) => {}
        }
        self.session.apply_push(event);
    }
}

enum Step {
    Completion(Completion),
    Push(Option<PushEvent>),
    Ui(Option<TuiEvent>),
}

async fn next_push(client: &mut Option<ConnectionClient>) -> Option<PushEvent> {
    match client {
        Some(client) => client.recv().await,
        None => std::future::pending().await,
    }
}

/// Main app loop.
pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: BuilderSession,
    mut client: Option<ConnectionClient>,
) -> anyhow::Result<()> {
    let mut events = EventLoop::new(session.bus().subscribe());
    let mut app = App::new(session, client.is_some());

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        let step = tokio::select! {
            Some(completion) = app.session.next_completion() => Step::Completion(completion),
            push = next_push(&mut client) => Step::Push(push),
            event = events.next() => Step::Ui(event),
        };

        match step {
            Step::Completion(completion) => app.session.apply(completion),
            Step::Push(Some(event)) => app.handle_push(event),
            Step::Push(None) => {
                debug!("Push channel ended");
                app.push = PushStatus::Offline;
                if let Some(client) = client.take() {
                    client.close().await;
                }
            }
            Step::Ui(Some(TuiEvent::Key(key))) => match app.input.handle_key(key) {
                InputAction::Quit => break,
                InputAction::Submit(command) => {
                    if let Some(req) = app.apply_command(command) {
                        match &client {
                            Some(client) => {
                                if let Err(e) = client.send(req).await {
                                    warn!(error = %e, "Push send failed");
                                    app.notice = Some(e.to_string());
                                }
                            }
                            None => {
                                app.notice = Some("Push channel is not connected".to_string());
                            }
                        }
                    }
                }
                InputAction::Invalid(hint) => app.notice = Some(hint),
                InputAction::ScrollUp => app.scroll_up(),
                InputAction::ScrollDown => app.scroll_down(),
                InputAction::None => {}
            },
            Step::Ui(Some(TuiEvent::Builder(event))) => app.handle_builder_event(event),
            Step::Ui(Some(TuiEvent::Tick)) => {
                app.tick_count += 1;
            }
            Step::Ui(Some(TuiEvent::Resize(_, _))) => {}
            Step::Ui(None) => break,
        }
    }

    if let Some(client) = client.take() {
        client.close().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentnet_builder::AgentFormDraft;
    use agentnet_core::config::BuilderConfig;
    use agentnet_core::event::EventBus;
    use agentnet_core::types::PushFrame;
    use agentnet_test_utils::MockBackend;

    fn demo_app() -> App {
        let session = BuilderSession::new(
            &BuilderConfig::default(),
            MockBackend::new().into_arc(),
            EventBus::default(),
        );
        App::new(session, true)
    }

    #[test]
    fn test_select_moves_the_selection() {
        let mut app = demo_app();
        app.apply_command(Command::Select("1".into()));
        app.apply_command(Command::Select("3".into()));

        let selected: Vec<&str> = app
            .session
            .graph()
            .nodes()
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(selected, vec!["3"]);
    }

    #[test]
    fn test_select_unknown_node_keeps_selection() {
        let mut app = demo_app();
        app.apply_command(Command::Select("2".into()));
        assert!(app.intents_for(&Command::Select("ghost".into())).is_empty());

        app.apply_command(Command::Select("ghost".into()));
        assert_eq!(app.notice.as_deref(), Some("No node with id ghost"));
        assert_eq!(app.session.graph().selected().unwrap().id, "2");
        assert!(app.apply_command(Command::Say("still here".into())).is_some());
    }

    #[test]
    fn test_scroll_is_clamped_to_transcript() {
        let mut app = demo_app();
        let len = app.session.log().len();
        for _ in 0..20 {
            app.scroll_up();
        }
        assert_eq!(app.scroll_offset, len);

        app.scroll_down();
        assert_eq!(app.scroll_offset, len.saturating_sub(3));
        for _ in 0..20 {
            app.scroll_down();
        }
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_remove_targets_node_or_edge() {
        let app = demo_app();
        assert_eq!(
            app.intents_for(&Command::Remove("2".into())),
            vec![Intent::RemoveNode { id: "2".into() }]
        );
        assert_eq!(
            app.intents_for(&Command::Remove("e1-2".into())),
            vec![Intent::RemoveEdge { id: "e1-2".into() }]
        );
    }

    #[test]
    fn test_agent_command_uses_default_model() {
        let app = demo_app();
        let draft = AgentFormDraft {
            name: "Critic".into(),
            role: "Reviews".into(),
            ..AgentFormDraft::default()
        };
        let intents = app.intents_for(&Command::Agent(draft));
        assert_eq!(intents.len(), 3);
        match &intents[1] {
            Intent::EditAgentForm(draft) => assert_eq!(draft.model, "gpt-4o-mini"),
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn test_say_needs_a_selected_node() {
        let mut app = demo_app();
        assert!(app.apply_command(Command::Say("hi".into())).is_none());
        assert!(app.notice.is_some());

        app.apply_command(Command::Select("2".into()));
        assert_eq!(
            app.apply_command(Command::Say("hi".into())),
            Some(SendRequest {
                sender: "2".into(),
                message: "hi".into()
            })
        );
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_connect_unknown_node_sets_notice() {
        let mut app = demo_app();
        app.apply_command(Command::Connect {
            source: "1".into(),
            target: "ghost".into(),
        });
        assert_eq!(app.notice.as_deref(), Some("No node with id ghost"));
        assert_eq!(app.session.graph().edges().len(), 2);
    }

    #[test]
    fn test_push_events_update_status_and_log() {
        let mut app = demo_app();
        let before = app.session.log().len();
        app.handle_push(PushEvent::Connected);
        assert_eq!(app.push, PushStatus::Connected);
        app.handle_push(PushEvent::Frame(PushFrame {
            from: "a".into(),
            to: "b".into(),
            message: "m".into(),
        }));
        app.handle_push(PushEvent::Error("reset".into()));
        assert_eq!(app.push, PushStatus::Offline);
        assert_eq!(app.session.log().len(), before + 3);
    }
}
