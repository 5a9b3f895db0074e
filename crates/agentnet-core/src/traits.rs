use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{
    ConnectRequest, CreateAgentRequest, CreateAgentResponse, SendRequest, SendResponse,
};

/// The orchestration backend's request/response surface.
///
/// Implementations must treat any non-success status as an error so callers
/// can take their fallback path uniformly.
pub trait Backend: Send + Sync + 'static {
    /// `POST /agent`
    fn create_agent(&self, req: CreateAgentRequest) -> BoxFuture<'_, Result<CreateAgentResponse>>;

    /// `POST /connect`
    fn connect(&self, req: ConnectRequest) -> BoxFuture<'_, Result<()>>;

    /// `POST /send`
    fn send(&self, req: SendRequest) -> BoxFuture<'_, Result<SendResponse>>;
}
