// src/api/http/assistant.rs
// Conversational endpoints. Text and voice share one pipeline; voice only
// adds a transcription hop in front of it.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult, IntoApiError};
use crate::assistant::{AssistantMessage, AssistantResponse};
use crate::config::CONFIG;
use crate::state::AppState;

use super::auth::UserId;

#[derive(Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct VoiceRequest {
    pub audio: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(request): Json<MessageRequest>,
) -> ApiResult<Json<AssistantResponse>> {
    if request.content.trim().is_empty() {
        return Err(ApiError::unprocessable_entity("Message content cannot be empty"));
    }

    let response = state
        .assistant
        .process_message(&user_id, &request.content)
        .await
        .into_api_error("Assistant request failed")?;
    Ok(Json(response))
}

pub async fn send_voice(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(request): Json<VoiceRequest>,
) -> ApiResult<Json<AssistantResponse>> {
    if request.audio.is_empty() {
        return Err(ApiError::unprocessable_entity("Audio payload cannot be empty"));
    }

    let response = state
        .assistant
        .process_voice(&user_id, &request.audio)
        .await
        .into_api_error("Voice request failed")?;
    Ok(Json(response))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<AssistantMessage>>> {
    let limit = query
        .limit
        .unwrap_or(CONFIG.history_default_limit)
        .clamp(1, CONFIG.history_max_limit);

    let history = state
        .assistant
        .history(&user_id, limit)
        .await
        .into_api_error("Database error during retrieving history")?;
    Ok(Json(history))
}
