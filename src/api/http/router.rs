// src/api/http/router.rs
// HTTP router composition for REST API endpoints

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;

use super::{
    assistant::{get_history, send_message, send_voice},
    handlers::health_handler,
    tasks::{
        create_task, delete_task, generate_breakdown, generation_usage, get_task, get_tasks,
        regenerate_breakdown, update_task,
    },
};
use crate::config::CONFIG;
use crate::state::AppState;

/// Full application router, ready to serve.
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))

        // Tasks
        .route("/api/tasks/create", post(create_task))
        .route("/api/tasks/generate", post(generate_breakdown))
        .route("/api/tasks/usage", get(generation_usage))
        .route("/api/tasks/all", get(get_tasks))
        .route(
            "/api/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{task_id}/regenerate-breakdown", post(regenerate_breakdown))

        // Assistant
        .route("/api/assistant/message", post(send_message))
        .route("/api/assistant/voice", post(send_voice))
        .route("/api/assistant/history", get(get_history))

        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(CONFIG.request_timeout)))
        .layer(cors_layer())
        .with_state(app_state)
}

fn cors_layer() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    match CONFIG.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any", CONFIG.cors_origin);
            layer.allow_origin(tower_http::cors::Any)
        }
    }
}
