use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::types::{SendRequest, SendResponse};
use agentnet_graph::GraphStore;

use crate::commands::{AgentCommandService, Completion};
use crate::log::LogStore;

/// The one flow run a session may have in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSession {
    pub in_flight: bool,
    /// Entry node of the current run.
    pub entry: Option<String>,
}

/// Starts flow runs from the graph's entry node, one at a time.
#[derive(Debug, Default)]
pub struct FlowRunner {
    session: RunSession,
}

impl FlowRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.in_flight
    }

    /// Start a run. Refused while another is in flight; an empty graph or a
    /// graph without an entry node is reported in the journal and nothing is
    /// sent.
    pub fn start(
        &mut self,
        graph: &GraphStore,
        log: &mut LogStore,
        commands: &AgentCommandService,
    ) -> Result<()> {
        if self.session.in_flight {
            debug!(entry = ?self.session.entry, "Run already in flight, rejecting");
            return Err(AgentNetError::AlreadyRunning);
        }

        let entry = match graph.entry_node() {
            Ok(node) => node,
            Err(e) => {
                info!(error = %e, "Flow not started");
                log.append("System", "User", format!("Cannot run flow: {}", e));
                return Err(e);
            }
        };

        let (entry_id, label) = (entry.id.clone(), entry.label.clone());
        self.session = RunSession {
            in_flight: true,
            entry: Some(entry_id.clone()),
        };
        info!(entry = %entry_id, "Flow run started");
        log.append("System", "User", format!("Running flow from {}...", label));

        commands.send_run(
            entry_id.clone(),
            SendRequest {
                sender: entry_id,
                message: format!("Start flow from {}", label),
            },
        );
        Ok(())
    }

    /// Record the outcome of the in-flight run. The flag is cleared on every
    /// path.
    pub fn finish(
        &mut self,
        entry_id: &str,
        result: Result<SendResponse>,
        graph: &GraphStore,
        log: &mut LogStore,
    ) {
        if self.session.entry.as_deref() != Some(entry_id) {
            debug!(entry = %entry_id, current = ?self.session.entry, "Completion for a different run");
        }
        self.session = RunSession::default();

        match result {
            Ok(resp) if resp.messages().is_empty() => {
                info!(entry = %entry_id, "Flow completed with no messages");
                log.append("System", "User", "Flow completed with no messages");
            }
            Ok(resp) => {
                let messages = resp.messages();
                let from = graph.label_of(entry_id);
                for msg in messages {
                    log.append(from, graph.label_of(&msg.target), msg.reply.as_str());
                }
                info!(entry = %entry_id, count = messages.len(), "Flow completed");
                log.append(
                    "System",
                    "User",
                    format!("Flow completed: {} message(s)", messages.len()),
                );
            }
            Err(e) => {
                warn!(entry = %entry_id, error = %e, "Flow run failed");
                log.append("System", "User", format!("Flow failed: {}", e));
            }
        }
    }
}

/// Reports a run's completion exactly once, as cancelled if it is dropped
/// before [`RunGuard::finish`] is called.
pub(crate) struct RunGuard {
    tx: mpsc::UnboundedSender<Completion>,
    entry_id: String,
    reported: bool,
}

impl RunGuard {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Completion>, entry_id: String) -> Self {
        Self {
            tx,
            entry_id,
            reported: false,
        }
    }

    pub(crate) fn finish(mut self, result: Result<SendResponse>) {
        self.report(result);
    }

    fn report(&mut self, result: Result<SendResponse>) {
        self.reported = true;
        let _ = self.tx.send(Completion::RunFinished {
            entry_id: std::mem::take(&mut self.entry_id),
            result,
        });
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.reported {
            self.report(Err(AgentNetError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentnet_core::types::FlowMessage;
    use agentnet_test_utils::graph_of;

    fn running(entry: &str) -> FlowRunner {
        FlowRunner {
            session: RunSession {
                in_flight: true,
                entry: Some(entry.to_string()),
            },
        }
    }

    #[test]
    fn test_finish_empty_result() {
        let graph = graph_of(&["a"], &[]);
        let mut log = LogStore::new();
        let mut runner = running("a");
        runner.finish("a", Ok(SendResponse::default()), &graph, &mut log);
        assert!(!runner.is_running());
        assert_eq!(runner.session(), &RunSession::default());
        assert_eq!(log.last().unwrap().message, "Flow completed with no messages");
    }

    #[test]
    fn test_finish_logs_messages_by_label() {
        let graph = graph_of(&["a", "b"], &[("a", "b")]);
        let mut log = LogStore::new();
        let mut runner = running("a");
        let resp = SendResponse {
            messages: Some(vec![
                FlowMessage { target: "b".into(), reply: "hello".into() },
                FlowMessage { target: "gone".into(), reply: "late".into() },
            ]),
        };
        runner.finish("a", Ok(resp), &graph, &mut log);

        let lines: Vec<(&str, &str, &str)> = log
            .entries()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("A", "B", "hello"),
                ("A", "gone", "late"),
                ("System", "User", "Flow completed: 2 message(s)"),
            ]
        );
    }

    #[test]
    fn test_finish_failure_clears_flag() {
        let graph = graph_of(&["a"], &[]);
        let mut log = LogStore::new();
        let mut runner = running("a");
        runner.finish(
            "a",
            Err(AgentNetError::Backend("connection refused".into())),
            &graph,
            &mut log,
        );
        assert!(!runner.is_running());
        assert_eq!(
            log.last().unwrap().message,
            "Flow failed: Backend request failed: connection refused"
        );
    }

    #[test]
    fn test_dropped_guard_reports_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(RunGuard::new(tx, "a".into()));
        match rx.try_recv().unwrap() {
            Completion::RunFinished { entry_id, result } => {
                assert_eq!(entry_id, "a");
                assert!(matches!(result, Err(AgentNetError::Cancelled)));
            }
            other => panic!("unexpected completion: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finished_guard_reports_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        RunGuard::new(tx, "a".into()).finish(Ok(SendResponse::default()));
        assert!(matches!(
            rx.try_recv().unwrap(),
            Completion::RunFinished { result: Ok(_), .. }
        ));
        assert!(rx.try_recv().is_err());
    }
}
