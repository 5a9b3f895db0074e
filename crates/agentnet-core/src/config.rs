use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentNetError, Result};

/// Top-level AgentNet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where the orchestration backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for the REST endpoints (`/agent`, `/connect`, `/send`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// WebSocket URL of the push channel.
    #[serde(default = "default_push_url")]
    pub push_url: String,
    /// Per-request timeout. Flow runs can take a while.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            push_url: default_push_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Open with the three-node starter graph and welcome messages.
    #[serde(default = "default_seed_demo")]
    pub seed_demo: bool,
    /// Model preselected in a fresh agent form.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            seed_demo: default_seed_demo(),
            default_model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: Option<String>,
    /// Log file used while the terminal UI owns stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_push_url() -> String { "ws://localhost:8000/ws".to_string() }
fn default_request_timeout_secs() -> u64 { 120 }
fn default_seed_demo() -> bool { true }
fn default_model() -> String { "gpt-4o-mini".to_string() }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| AgentNetError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded)
            .map_err(|e| AgentNetError::Config(e.to_string()))
    }

    /// Like [`AppConfig::load`], but a missing file yields defaults unless the
    /// path was given explicitly.
    pub fn load_or_default(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
