// src/analyzer/cache.rs
// Fingerprint-keyed cache of serialized breakdowns. A failed lookup is a
// miss and a failed write is logged and dropped; the cache must never fail
// the operation it is accelerating.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::warn;

#[derive(Clone)]
pub struct BreakdownCache {
    pool: SqlitePool,
}

/// Normalized cache key for a task's title and description.
pub fn fingerprint(title: &str, description: &str) -> String {
    format!(
        "{}:{}",
        title.trim().to_lowercase(),
        description.trim().to_lowercase()
    )
}

impl BreakdownCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, task_key: &str) -> Option<String> {
        let result = sqlx::query("SELECT breakdown FROM breakdown_cache WHERE task_key = ?")
            .bind(task_key)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => row.map(|r| r.get("breakdown")),
            Err(e) => {
                warn!("Error accessing breakdown cache: {}", e);
                None
            }
        }
    }

    /// Insert-or-replace, so a fresh generation overwrites a stale or
    /// undecodable entry under the same key.
    pub async fn put(&self, task_key: &str, breakdown_json: &str) {
        let result = sqlx::query(
            r#"
            INSERT OR REPLACE INTO breakdown_cache (task_key, breakdown, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(task_key)
        .bind(breakdown_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("Error saving to breakdown cache: {}", e);
        }
    }
}
