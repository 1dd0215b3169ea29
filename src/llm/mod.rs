// src/llm/mod.rs
// Unified completion abstraction over the supported LLM backends.

pub mod anthropic;
pub mod ollama;
pub mod transcription;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use transcription::{TranscriptionBackend, WhisperClient};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of an assistant conversation, backend-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Text-completion capability. Callers never know which backend is live;
/// construction happens once in main and the instance is injected through
/// AppState.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a completion over a system prompt and a chronological turn list,
    /// returning the assistant's text.
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Build the configured backend. Unknown values fall back to Anthropic.
pub fn backend_from_config() -> Result<std::sync::Arc<dyn CompletionBackend>> {
    match CONFIG.completion_backend.as_str() {
        "ollama" => Ok(std::sync::Arc::new(OllamaClient::new(
            CONFIG.ollama_base_url.clone(),
            CONFIG.ollama_model.clone(),
        )?)),
        other => {
            if other != "anthropic" {
                tracing::warn!(
                    "Unknown completion backend '{}', defaulting to anthropic",
                    other
                );
            }
            Ok(std::sync::Arc::new(AnthropicClient::new(
                CONFIG.anthropic_api_key.clone(),
            )?))
        }
    }
}
