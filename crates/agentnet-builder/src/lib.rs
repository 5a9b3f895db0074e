//! The builder session: everything one canvas view owns.
//!
//! `BuilderSession` ties the graph, the message journal, the agent form and
//! the flow runner together. User actions arrive as [`Intent`]s; backend
//! answers arrive as [`Completion`]s on the session's own channel and are
//! applied in arrival order.

pub mod commands;
pub mod draft;
pub mod log;
pub mod runner;
pub mod session;

pub use commands::{AgentCommandService, Completion, PendingAgent};
pub use draft::{split_goals, AgentForm, AgentFormDraft};
pub use log::{LogEntry, LogStore};
pub use runner::{FlowRunner, RunSession};
pub use session::{BuilderSession, Intent};
