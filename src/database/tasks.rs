use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::Database;
use crate::errors::TaskError;
use crate::scheduler::{NewTask, Task, TaskKind, TaskStore};

type TaskRow = (
    i32,
    TaskKind,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<Value>,
    bool,
);

fn into_task(row: TaskRow) -> Task {
    let (id, kind, subject_id, created_at, expires_at, payload, processed) = row;
    Task {
        id,
        kind,
        subject_id,
        created_at,
        expires_at,
        payload,
        processed,
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn insert(&self, task: NewTask) -> Result<i32, TaskError> {
        let (task_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO tasks (kind, subject_id, expires_at, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING task_id
            "#,
        )
        .bind(task.kind)
        .bind(task.subject_id)
        .bind(task.expires_at)
        .bind(task.payload)
        .fetch_one(self.pool())
        .await?;

        Ok(task_id)
    }

    async fn fetch_due(&self, kind: TaskKind, now: DateTime<Utc>) -> Result<Vec<Task>, TaskError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT task_id, kind, subject_id, created_at, expires_at, payload, processed
            FROM tasks
            WHERE kind = $1 AND NOT processed AND expires_at <= $2
            ORDER BY created_at
            "#,
        )
        .bind(kind)
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(into_task).collect())
    }

    async fn delete(&self, id: i32) -> Result<(), TaskError> {
        sqlx::query("DELETE FROM tasks WHERE task_id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    async fn mark_processed(&self, id: i32) -> Result<(), TaskError> {
        sqlx::query("UPDATE tasks SET processed = TRUE WHERE task_id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}

impl Database {
    /// The latest unprocessed task of a kind for one subject, if any.
    ///
    /// Used by features to avoid double-scheduling (a second repost penalty
    /// while one is pending) and to gate actions on a still-running timer
    /// (roulette lockout). Callers that care whether the timer has actually
    /// run out should check `expires_at` themselves - a row may be expired
    /// but not yet picked up by the poller.
    pub async fn pending_task_for(
        &self,
        kind: TaskKind,
        subject_id: i64,
    ) -> Result<Option<Task>, TaskError> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT task_id, kind, subject_id, created_at, expires_at, payload, processed
            FROM tasks
            WHERE kind = $1 AND subject_id = $2 AND NOT processed
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(kind)
        .bind(subject_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(into_task))
    }
}
