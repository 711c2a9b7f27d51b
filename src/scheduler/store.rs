use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{NewTask, Task, TaskKind};
use crate::errors::TaskError;

/// Persistence contract consumed by the scheduler.
///
/// Implemented by the Postgres `Database` for production and by
/// `MemoryTaskStore` for tests. Duplicate-processing protection is the
/// poller's job, not the store's - `fetch_due` may be called by concurrent
/// ticks and must simply report the table as it stands.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new pending task and return its id
    async fn insert(&self, task: NewTask) -> Result<i32, TaskError>;

    /// All unprocessed tasks of `kind` with `expires_at <= now`, oldest first
    async fn fetch_due(&self, kind: TaskKind, now: DateTime<Utc>) -> Result<Vec<Task>, TaskError>;

    /// Remove a task row
    async fn delete(&self, id: i32) -> Result<(), TaskError>;

    /// Flag a task row as handled without removing it
    async fn mark_processed(&self, id: i32) -> Result<(), TaskError>;
}

/// In-memory `TaskStore` used by the scheduler tests.
///
/// Holds rows behind a plain mutex and supports a one-shot delete failpoint
/// for simulating a crash between "handler succeeded" and "row removed".
#[derive(Default)]
pub struct MemoryTaskStore {
    inner: std::sync::Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i32,
    rows: Vec<Task>,
    fail_next_delete: bool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `delete` call fail with a transient-looking error
    pub fn fail_next_delete(&self) {
        self.inner.lock().expect("store mutex poisoned").fail_next_delete = true;
    }

    /// Number of rows currently in the store, processed or not
    pub fn row_count(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").rows.len()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<i32, TaskError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(Task {
            id,
            kind: task.kind,
            subject_id: task.subject_id,
            created_at: Utc::now(),
            expires_at: task.expires_at,
            payload: task.payload,
            processed: false,
        });
        Ok(id)
    }

    async fn fetch_due(&self, kind: TaskKind, now: DateTime<Utc>) -> Result<Vec<Task>, TaskError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut due: Vec<Task> = inner
            .rows
            .iter()
            .filter(|task| task.kind == kind && task.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|task| task.created_at);
        Ok(due)
    }

    async fn delete(&self, id: i32) -> Result<(), TaskError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.fail_next_delete {
            inner.fail_next_delete = false;
            return Err(TaskError::Handler("simulated store failure".to_string()));
        }
        inner.rows.retain(|task| task.id != id);
        Ok(())
    }

    async fn mark_processed(&self, id: i32) -> Result<(), TaskError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if let Some(task) = inner.rows.iter_mut().find(|task| task.id == id) {
            task.processed = true;
        }
        Ok(())
    }
}
