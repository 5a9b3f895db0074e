use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use agentnet_core::config::BackendConfig;
use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::traits::Backend;
use agentnet_core::types::{
    ConnectRequest, CreateAgentRequest, CreateAgentResponse, SendRequest, SendResponse,
};

/// [`Backend`] over the orchestration server's REST endpoints.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AgentNetError::Backend(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST `body` as JSON and return the raw body text of a 2xx response.
    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentNetError::Backend(format!("POST {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentNetError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }
        // A body cut short is a failed call, not an empty answer.
        resp.text()
            .await
            .map_err(|e| AgentNetError::Backend(format!("POST {url}: {e}")))
    }

    /// Decode a success body, treating an unreadable one as "no fields".
    fn decode_lenient<R: DeserializeOwned + Default>(path: &str, text: &str) -> R {
        if text.trim().is_empty() {
            return R::default();
        }
        match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(path, error = %e, "Unreadable success body, ignoring");
                R::default()
            }
        }
    }
}

impl Backend for HttpBackend {
    fn create_agent(&self, req: CreateAgentRequest) -> BoxFuture<'_, Result<CreateAgentResponse>> {
        Box::pin(async move {
            let text = self.post("agent", &req).await?;
            Ok(Self::decode_lenient("agent", &text))
        })
    }

    fn connect(&self, req: ConnectRequest) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.post("connect", &req).await?;
            Ok(())
        })
    }

    fn send(&self, req: SendRequest) -> BoxFuture<'_, Result<SendResponse>> {
        Box::pin(async move {
            let text = self.post("send", &req).await?;
            Ok(Self::decode_lenient("send", &text))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = BackendConfig {
            base_url: "http://localhost:8000/".into(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.url("agent"), "http://localhost:8000/agent");
    }

    #[test]
    fn test_decode_lenient() {
        let resp: CreateAgentResponse = HttpBackend::decode_lenient("agent", "");
        assert!(resp.agent_id.is_none());
        let resp: CreateAgentResponse = HttpBackend::decode_lenient("agent", "<html>");
        assert!(resp.agent_id.is_none());
        let resp: CreateAgentResponse =
            HttpBackend::decode_lenient("agent", r#"{"agent_id":"x1"}"#);
        assert_eq!(resp.agent_id.as_deref(), Some("x1"));
    }
}
