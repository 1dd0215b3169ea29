// src/state.rs
// Shared application state handed to every handler.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::analyzer::{BreakdownCache, TaskAnalyzer, UsageTracker};
use crate::assistant::{AssistantService, MessageStore};
use crate::config::CONFIG;
use crate::llm::{CompletionBackend, TranscriptionBackend};
use crate::tasks::TaskStore;

pub struct AppState {
    pub tasks: TaskStore,
    pub analyzer: Arc<TaskAnalyzer>,
    pub assistant: Arc<AssistantService>,
}

/// Wire the stores and services over one pool and one completion backend.
pub fn create_app_state(
    pool: SqlitePool,
    backend: Arc<dyn CompletionBackend>,
    transcription: Option<Arc<dyn TranscriptionBackend>>,
) -> AppState {
    let tasks = TaskStore::new(pool.clone());

    let analyzer = Arc::new(TaskAnalyzer::new(
        backend.clone(),
        BreakdownCache::new(pool.clone()),
        UsageTracker::new(pool.clone(), CONFIG.daily_generation_limit),
    ));

    let assistant = Arc::new(AssistantService::new(
        backend,
        transcription,
        MessageStore::new(pool),
        tasks.clone(),
    ));

    AppState { tasks, analyzer, assistant }
}
