// src/assistant/store.rs
// Append-only conversation log. History reads take the most recent N rows
// and reverse them back into chronological order.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::types::{AssistantMessage, MessageType};

#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, message: &AssistantMessage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assistant_messages (id, user_id, content, type, category, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.user_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(&message.category)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_history(&self, user_id: &str, limit: i64) -> Result<Vec<AssistantMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, content, type, category, timestamp
            FROM assistant_messages
            WHERE user_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<AssistantMessage> = rows
            .into_iter()
            .map(|row| {
                let message_type: String = row.get("type");
                let timestamp: DateTime<Utc> = row.get("timestamp");
                AssistantMessage {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    content: row.get("content"),
                    message_type: MessageType::from_str(&message_type),
                    category: row.get("category"),
                    timestamp,
                }
            })
            .collect();

        messages.reverse();
        Ok(messages)
    }
}
