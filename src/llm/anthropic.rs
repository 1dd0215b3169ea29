// src/llm/anthropic.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use super::{ChatTurn, CompletionBackend};
use crate::config::CONFIG;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("ANTHROPIC_API_KEY is not set"));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(CONFIG.request_timeout))
                .build()?,
            api_key,
        })
    }

    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse> {
        let mut attempt = 0;
        let max_attempts = 3;

        loop {
            let response = self
                .client
                .post(API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&request)
                .send()
                .await?;

            match response.status().as_u16() {
                200 => return Ok(response.json::<MessageResponse>().await?),
                429 => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(anyhow!("Rate limited after {} attempts", max_attempts));
                    }
                    let wait_time = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!("Anthropic rate limited, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
                code => {
                    let error_body = response.text().await?;
                    return Err(anyhow!("API error {}: {}", code, error_body));
                }
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for AnthropicClient {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        // The Messages API rejects an empty message list; open with a
        // neutral user turn when the caller only has a system prompt.
        let messages: Vec<Message> = if turns.is_empty() {
            vec![Message { role: "user".into(), content: "Hello".into() }]
        } else {
            turns
                .iter()
                .map(|t| Message {
                    role: t.role.as_str().to_string(),
                    content: t.content.clone(),
                })
                .collect()
        };

        let request = MessageRequest {
            model: CONFIG.anthropic_model.clone(),
            messages,
            max_tokens: CONFIG.anthropic_max_tokens,
            temperature: Some(CONFIG.anthropic_temperature),
            system: Some(system.to_string()),
        };

        let response = self.create_message(request).await?;
        Ok(response.get_text())
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize, Clone)]
struct MessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    #[allow(dead_code)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessageResponse {
    fn get_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_text_joins_text_blocks_only() {
        let response: MessageResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "id": "x", "name": "n", "input": {}},
                {"type": "text", "text": "second"}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();

        assert_eq!(response.get_text(), "first\nsecond");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(AnthropicClient::new(String::new()).is_err());
    }
}
