// src/api/http/tasks.rs
// Task CRUD plus breakdown generation endpoints. A breakdown is an
// enhancement on create (failures and quota exhaustion degrade to a plain
// task) but the primary product of the generate endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::analyzer::{AnalyzerError, GenerationOutcome};
use crate::api::error::{ApiError, ApiResult, IntoApiError, IntoApiErrorOption};
use crate::state::AppState;
use crate::tasks::{Task, TaskBreakdown, TaskRequest};

use super::auth::UserId;

#[derive(Serialize)]
pub struct UsageResponse {
    pub daily_limit: i64,
    pub generations_remaining: i64,
}

fn map_analyzer_error(err: AnalyzerError) -> ApiError {
    match err {
        AnalyzerError::QuotaExceeded { limit } => ApiError::too_many_requests(format!(
            "Daily generation limit of {} reached, try again tomorrow",
            limit
        )),
        AnalyzerError::Storage(e) => {
            warn!("Usage tracking failed: {:?}", e);
            ApiError::internal("Could not record generation usage")
        }
    }
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(request): Json<TaskRequest>,
) -> ApiResult<Json<Task>> {
    request
        .validate()
        .map_err(|e| ApiError::unprocessable_entity(e.to_string()))?;

    let mut task = request.into_task(&user_id);

    // Best-effort enrichment: quota exhaustion and generation failures
    // leave the task without a breakdown; only usage persistence is fatal.
    match state.analyzer.get_or_generate(&task).await {
        Ok(outcome) => {
            if let Some(breakdown) = outcome.breakdown() {
                task.breakdown = Some(breakdown);
                task.last_analyzed = true;
            }
        }
        Err(AnalyzerError::QuotaExceeded { limit }) => {
            warn!("User {} over daily limit of {}, creating task bare", user_id, limit);
        }
        Err(err @ AnalyzerError::Storage(_)) => return Err(map_analyzer_error(err)),
    }

    state
        .tasks
        .create(&task)
        .await
        .into_api_error("Database error during creating task")?;

    Ok(Json(task))
}

pub async fn generate_breakdown(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(request): Json<TaskRequest>,
) -> ApiResult<Json<Value>> {
    request
        .validate()
        .map_err(|e| ApiError::unprocessable_entity(e.to_string()))?;

    let task = request.into_task(&user_id);
    let breakdown = run_generation(&state, &task).await?;

    Ok(Json(json!({ "breakdown": breakdown })))
}

async fn run_generation(state: &AppState, task: &Task) -> ApiResult<TaskBreakdown> {
    let outcome = state
        .analyzer
        .get_or_generate(task)
        .await
        .map_err(map_analyzer_error)?;

    match outcome {
        GenerationOutcome::Generated(b) | GenerationOutcome::Cached(b) => Ok(b),
        GenerationOutcome::Skipped(reason) => {
            warn!("Breakdown generation skipped: {:?}", reason);
            Err(ApiError::internal("Failed to generate task breakdown"))
        }
    }
}

pub async fn generation_usage(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<UsageResponse>> {
    let remaining = state
        .analyzer
        .usage()
        .remaining(&user_id)
        .await
        .into_api_error("Database error during reading usage")?;

    Ok(Json(UsageResponse {
        daily_limit: state.analyzer.usage().daily_limit(),
        generations_remaining: remaining,
    }))
}

pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .tasks
        .list_for_user(&user_id)
        .await
        .into_api_error("Database error during retrieving tasks")?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state
        .tasks
        .get(&task_id, &user_id)
        .await
        .into_api_error("Database error during retrieving task")?
        .ok_or_not_found("Task not found")?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
    Json(request): Json<TaskRequest>,
) -> ApiResult<Json<Task>> {
    request
        .validate()
        .map_err(|e| ApiError::unprocessable_entity(e.to_string()))?;

    let task = state
        .tasks
        .update(&task_id, &user_id, &request)
        .await
        .into_api_error("Database error during updating task")?
        .ok_or_not_found("Task not found")?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .tasks
        .delete(&task_id, &user_id)
        .await
        .into_api_error("Database error during deleting task")?;

    if !deleted {
        return Err(ApiError::not_found("Task not found"));
    }
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

pub async fn regenerate_breakdown(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state
        .tasks
        .get(&task_id, &user_id)
        .await
        .into_api_error("Database error during retrieving task")?
        .ok_or_not_found("Task not found")?;

    let breakdown = run_generation(&state, &task).await?;

    let updated = state
        .tasks
        .set_breakdown(&task_id, &user_id, &breakdown)
        .await
        .into_api_error("Database error during saving breakdown")?
        .ok_or_not_found("Task not found")?;

    Ok(Json(updated))
}
