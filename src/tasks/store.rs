// src/tasks/store.rs
// Task persistence. Context and breakdown are stored as JSON text columns;
// every read/write is scoped to the owning user.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::types::{Task, TaskBreakdown, TaskContext, TaskRequest};

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, user_id, title, description, priority, status,
                context, breakdown, last_analyzed, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(&task.status)
        .bind(context_json(&task.context)?)
        .bind(breakdown_json(&task.breakdown)?)
        .bind(task.last_analyzed)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, description, priority, status,
                   context, breakdown, last_analyzed, created_at
            FROM tasks
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_task).collect()
    }

    pub async fn get(&self, task_id: &str, user_id: &str) -> Result<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, description, priority, status,
                   context, breakdown, last_analyzed, created_at
            FROM tasks
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_task).transpose()
    }

    /// Replace the mutable fields of an owned task. Returns the updated
    /// task, or None when it does not exist or belongs to someone else.
    pub async fn update(
        &self,
        task_id: &str,
        user_id: &str,
        request: &TaskRequest,
    ) -> Result<Option<Task>> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, priority = ?, status = ?, context = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.priority)
        .bind(request.status.to_lowercase())
        .bind(context_json(&request.context)?)
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(task_id, user_id).await
    }

    pub async fn set_breakdown(
        &self,
        task_id: &str,
        user_id: &str,
        breakdown: &TaskBreakdown,
    ) -> Result<Option<Task>> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET breakdown = ?, last_analyzed = 1
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(serde_json::to_string(breakdown)?)
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(task_id, user_id).await
    }

    /// Returns true when a row was removed.
    pub async fn delete(&self, task_id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn context_json(context: &Option<TaskContext>) -> Result<Option<String>> {
    context
        .as_ref()
        .map(|c| serde_json::to_string(c).map_err(Into::into))
        .transpose()
}

fn breakdown_json(breakdown: &Option<TaskBreakdown>) -> Result<Option<String>> {
    breakdown
        .as_ref()
        .map(|b| serde_json::to_string(b).map_err(Into::into))
        .transpose()
}

fn row_to_task(row: sqlx::sqlite::SqliteRow) -> Result<Task> {
    let context: Option<String> = row.get("context");
    let breakdown: Option<String> = row.get("breakdown");
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(Task {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        priority: row.get("priority"),
        status: row.get("status"),
        context: context.as_deref().map(serde_json::from_str).transpose()?,
        breakdown: breakdown.as_deref().map(serde_json::from_str).transpose()?,
        last_analyzed: row.get("last_analyzed"),
        created_at,
    })
}
