// src/llm/ollama.rs
// Local inference via an Ollama server's /api/generate endpoint. The chat
// history is flattened into a single prompt transcript because the generate
// API takes one string, not a message list.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{ChatTurn, CompletionBackend, Role};
use crate::config::CONFIG;

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(CONFIG.request_timeout))
                .build()?,
            base_url,
            model,
        })
    }

    fn flatten_prompt(system: &str, turns: &[ChatTurn]) -> String {
        let mut prompt = String::from(system);
        prompt.push_str("\n\n");
        for turn in turns {
            let role = match turn.role {
                Role::User => "Human",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(role);
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        let prompt = Self::flatten_prompt(system, turns);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": 0.7,
                    "num_predict": CONFIG.ollama_num_predict,
                    "stop": ["Human:", "Assistant:"],
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error: {}", body));
        }

        let data = response.json::<GenerateResponse>().await?;
        if let Some(error) = data.error {
            return Err(anyhow!("Ollama error: {}", error));
        }

        data.response
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("Ollama returned an empty completion"))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
