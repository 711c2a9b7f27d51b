use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{Task, TaskKind};
use crate::errors::TaskError;

/// The expiration action for one task kind.
///
/// Handlers resolve the platform entities referenced by `subject_id` and the
/// payload themselves, perform the action, and report the outcome through
/// `Result`. Where feasible they are idempotent (removing a role the member
/// no longer has is a success), since a task that fails between the action
/// and row removal is retried on the next tick.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> Result<(), TaskError>;
}

/// Maps each task kind to its handler.
///
/// Built once during startup, then shared immutably with the poller - no
/// locking needed at dispatch time.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for a kind; registering a kind twice is an error
    pub fn register(
        &mut self,
        kind: TaskKind,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), TaskError> {
        if self.handlers.contains_key(&kind) {
            return Err(TaskError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Kinds that have a handler, i.e. the kinds the poller should watch
    pub fn kinds(&self) -> Vec<TaskKind> {
        self.handlers.keys().copied().collect()
    }

    /// Run the registered handler for `task`
    pub async fn dispatch(&self, task: &Task) -> Result<(), TaskError> {
        let handler = self
            .handlers
            .get(&task.kind)
            .ok_or(TaskError::NoHandler(task.kind))?;

        handler.handle(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct OkHandler;

    #[async_trait]
    impl TaskHandler for OkHandler {
        async fn handle(&self, _task: &Task) -> Result<(), TaskError> {
            Ok(())
        }
    }

    fn dummy_task(kind: TaskKind) -> Task {
        Task {
            id: 1,
            kind,
            subject_id: 42,
            created_at: Utc::now(),
            expires_at: Utc::now(),
            payload: None,
            processed: false,
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(TaskKind::Reminder, Arc::new(OkHandler))
            .unwrap();

        assert_eq!(registry.kinds(), vec![TaskKind::Reminder]);
        assert!(registry.dispatch(&dummy_task(TaskKind::Reminder)).await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_without_handler_fails() {
        let registry = HandlerRegistry::new();
        let err = registry
            .dispatch(&dummy_task(TaskKind::BurgerRot))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NoHandler(TaskKind::BurgerRot)));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(TaskKind::Reminder, Arc::new(OkHandler))
            .unwrap();
        let err = registry
            .register(TaskKind::Reminder, Arc::new(OkHandler))
            .unwrap_err();
        assert!(matches!(err, TaskError::DuplicateHandler(TaskKind::Reminder)));
    }
}
