// src/analyzer/usage.rs
// Per-user daily quota over breakdown generations. One row per (user, UTC
// day), created lazily on first check. The read-then-write is not guarded
// by a transaction; concurrent requests can slightly over-grant.

use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct UsageTracker {
    pool: SqlitePool,
    daily_limit: i64,
}

impl UsageTracker {
    pub fn new(pool: SqlitePool, daily_limit: i64) -> Self {
        Self { pool, daily_limit }
    }

    pub fn daily_limit(&self) -> i64 {
        self.daily_limit
    }

    fn today() -> DateTime<Utc> {
        Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    async fn count_for(&self, user_id: &str, day: DateTime<Utc>) -> Result<Option<i64>> {
        let row = sqlx::query(
            "SELECT generation_count FROM api_usage WHERE user_id = ? AND date = ?",
        )
        .bind(user_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("generation_count")))
    }

    /// Admit or reject one generation attempt. Persistence errors propagate;
    /// a failed quota check must never silently allow.
    pub async fn check_and_consume(&self, user_id: &str) -> Result<bool> {
        let today = Self::today();
        let now = Utc::now();

        let count = match self.count_for(user_id, today).await? {
            Some(count) => count,
            None => {
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO api_usage (user_id, date, generation_count, last_updated)
                    VALUES (?, ?, 0, ?)
                    "#,
                )
                .bind(user_id)
                .bind(today)
                .bind(now)
                .execute(&self.pool)
                .await?;
                0
            }
        };

        if count >= self.daily_limit {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE api_usage
            SET generation_count = generation_count + 1, last_updated = ?
            WHERE user_id = ? AND date = ?
            "#,
        )
        .bind(now)
        .bind(user_id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Generations left today, floored at zero.
    pub async fn remaining(&self, user_id: &str) -> Result<i64> {
        let used = self
            .count_for(user_id, Self::today())
            .await?
            .unwrap_or(0);
        Ok((self.daily_limit - used).max(0))
    }
}
