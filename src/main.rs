// src/main.rs

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tether_backend::api::http::http_router;
use tether_backend::config::CONFIG;
use tether_backend::llm::{backend_from_config, TranscriptionBackend, WhisperClient};
use tether_backend::state::create_app_state;
use tether_backend::storage::run_migrations;

#[derive(Parser, Debug)]
#[command(name = "tether", about = "ADHD-aware task and assistant backend")]
struct Args {
    /// Bind host, overrides TETHER_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides TETHER_PORT
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database URL, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&CONFIG.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Tether backend");
    info!("Completion backend: {}", CONFIG.completion_backend);

    let database_url = args
        .database_url
        .unwrap_or_else(|| CONFIG.database_url.clone());

    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.sqlite_max_connections)
        .connect(&database_url)
        .await?;
    run_migrations(&pool).await?;

    let backend = backend_from_config()?;
    info!("Using {} for completions", backend.name());

    let transcription: Option<Arc<dyn TranscriptionBackend>> =
        if CONFIG.openai_api_key.is_empty() {
            warn!("OPENAI_API_KEY not set, voice input disabled");
            None
        } else {
            Some(Arc::new(WhisperClient::new(CONFIG.openai_api_key.clone())?))
        };

    let app_state = Arc::new(create_app_state(pool, backend, transcription));
    let app = http_router(app_state);

    let host = args.host.unwrap_or_else(|| CONFIG.host.clone());
    let port = args.port.unwrap_or(CONFIG.port);
    let bind_address = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
