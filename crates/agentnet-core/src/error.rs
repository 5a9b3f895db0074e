use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentNetError {
    // Backend errors
    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },

    // Graph errors
    #[error("Invalid edge: {source_id} -> {target_id}")]
    InvalidEdge { source_id: String, target_id: String },

    #[error("Node already exists: {0}")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    // Flow errors
    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("No entry node (every node has an incoming edge)")]
    NoEntryNode,

    #[error("A flow run is already in flight")]
    AlreadyRunning,

    #[error("Request cancelled")]
    Cancelled,

    // Push channel errors
    #[error("Push channel error: {0}")]
    PushChannel(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentNetError>;
