// src/llm/transcription.rs
// Speech-to-text for the voice endpoint. Audio arrives base64-encoded from
// the client and is forwarded to Whisper as a multipart upload.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::CONFIG;

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Decode and transcribe base64-encoded audio, returning the text.
    async fn transcribe(&self, base64_audio: &str) -> Result<String>;
}

pub struct WhisperClient {
    client: Client,
    api_key: String,
}

impl WhisperClient {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not set"));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(CONFIG.request_timeout))
                .build()?,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl TranscriptionBackend for WhisperClient {
    async fn transcribe(&self, base64_audio: &str) -> Result<String> {
        let audio_bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_audio.trim())
            .map_err(|e| anyhow!("Invalid base64 audio payload: {}", e))?;

        let form = Form::new()
            .text("model", CONFIG.transcription_model.clone())
            .part(
                "file",
                Part::bytes(audio_bytes)
                    .file_name("voice.wav")
                    .mime_str("audio/wav")?,
            );

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Transcription API error: {}", body));
        }

        let data = response.json::<TranscriptionResponse>().await?;
        Ok(data.text)
    }
}
