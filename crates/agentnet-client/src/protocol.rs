use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::types::{PushFrame, SendRequest};

/// Parse one inbound push-channel text frame.
///
/// The frame must be a JSON object with string `from`, `to` and `message`.
pub fn parse_push_frame(text: &str) -> Result<PushFrame> {
    let frame: PushFrame = serde_json::from_str(text)?;
    Ok(frame)
}

/// Encode an outbound frame asking the backend to route `message` from `sender`.
pub fn encode_send_frame(req: &SendRequest) -> Result<String> {
    serde_json::to_string(req).map_err(AgentNetError::from)
}
