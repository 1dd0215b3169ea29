//! Startup migrations: each table is created idempotently so the schema is
//! guaranteed before any store touches the pool.

use anyhow::Result;
use sqlx::SqlitePool;

const CREATE_TASKS: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    priority INTEGER NOT NULL,
    status TEXT NOT NULL,
    context TEXT,
    breakdown TEXT,
    last_analyzed BOOLEAN NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_ASSISTANT_MESSAGES: &str = r#"
CREATE TABLE IF NOT EXISTS assistant_messages (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    type TEXT NOT NULL,
    category TEXT,
    timestamp DATETIME NOT NULL
);
"#;

const CREATE_BREAKDOWN_CACHE: &str = r#"
CREATE TABLE IF NOT EXISTS breakdown_cache (
    task_key TEXT PRIMARY KEY,
    breakdown TEXT NOT NULL,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_API_USAGE: &str = r#"
CREATE TABLE IF NOT EXISTS api_usage (
    user_id TEXT NOT NULL,
    date DATETIME NOT NULL,
    generation_count INTEGER NOT NULL DEFAULT 0,
    last_updated DATETIME NOT NULL,
    PRIMARY KEY (user_id, date)
);
"#;

const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
CREATE INDEX IF NOT EXISTS idx_messages_user_time ON assistant_messages(user_id, timestamp);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_TASKS).execute(pool).await?;
    sqlx::query(CREATE_ASSISTANT_MESSAGES).execute(pool).await?;
    sqlx::query(CREATE_BREAKDOWN_CACHE).execute(pool).await?;
    sqlx::query(CREATE_API_USAGE).execute(pool).await?;
    for statement in CREATE_INDEXES.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement).execute(pool).await?;
        }
    }
    Ok(())
}
