use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::policy::{Disposition, disposition};
use super::registry::HandlerRegistry;
use super::store::TaskStore;
use super::types::{Completion, Task, TaskKind};
use crate::errors::TaskError;

/// Result of one poll cycle for a kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// The previous tick was still running, nothing was done
    pub skipped: bool,
    /// Tasks handled and removed/flagged
    pub completed: usize,
    /// Tasks dropped because they can never succeed
    pub dropped: usize,
    /// Tasks left in place to retry on a later tick
    pub retained: usize,
}

impl TickOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Polls the task store and dispatches due tasks to their handlers.
///
/// One poller loop runs per registered kind, each on its own fixed cadence.
/// A guard per kind ensures overlapping ticks never double-process a row: a
/// tick that finds the guard held is skipped outright rather than queued, so
/// a slow handler delays processing instead of growing a backlog.
pub struct Scheduler {
    store: Arc<dyn TaskStore>,
    registry: HandlerRegistry,
    guards: DashMap<TaskKind, Arc<Mutex<()>>>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn TaskStore>, registry: HandlerRegistry) -> Self {
        Self {
            store,
            registry,
            guards: DashMap::new(),
        }
    }

    /// Spawn one poller loop per registered kind.
    ///
    /// The loops hold their first tick until `ready` turns true - the
    /// gateway cache is not usable before that, and handlers would only
    /// fail on entity lookups.
    pub fn start(self: Arc<Self>, ready: watch::Receiver<bool>) {
        for kind in self.registry.kinds() {
            let scheduler = Arc::clone(&self);
            let mut ready = ready.clone();

            tokio::spawn(async move {
                if ready.wait_for(|ready| *ready).await.is_err() {
                    // Sender dropped before startup finished
                    return;
                }

                info!("Task poller for {} tasks started", kind);

                let mut interval = tokio::time::interval(kind.poll_interval());
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.tick(kind).await {
                        warn!("{} tick aborted early: {}", kind, e);
                    }
                }
            });
        }
    }

    /// Run one due-check-and-dispatch cycle for `kind`.
    ///
    /// Fetching happens only after the guard is acquired, so due-ness always
    /// reflects the table as left by the previous tick. A store failure
    /// aborts the remainder of the tick; affected rows stay due and are
    /// picked up again on the next one.
    pub async fn tick(&self, kind: TaskKind) -> Result<TickOutcome, TaskError> {
        let guard = self.guard(kind);
        let Ok(_held) = guard.try_lock() else {
            debug!("Previous {} tick still running - skipping", kind);
            return Ok(TickOutcome::skipped());
        };

        let now = Utc::now();
        let due = self.store.fetch_due(kind, now).await?;

        let mut outcome = TickOutcome::default();
        for task in due {
            if !task.is_due(now) {
                continue;
            }

            match self.registry.dispatch(&task).await {
                Ok(()) => {
                    self.complete(&task).await?;
                    info!("Completed {} task {} for subject {}", kind, task.id, task.subject_id);
                    outcome.completed += 1;
                }
                Err(err) => match disposition(&err) {
                    Disposition::Delete => {
                        warn!(
                            "Dropping {} task {} for subject {}: {}",
                            kind, task.id, task.subject_id, err
                        );
                        self.store.delete(task.id).await?;
                        outcome.dropped += 1;
                    }
                    Disposition::Retain => {
                        error!(
                            "{} task {} for subject {} failed, will retry: {}",
                            kind, task.id, task.subject_id, err
                        );
                        outcome.retained += 1;
                    }
                },
            }
        }

        Ok(outcome)
    }

    /// Remove or flag a handled task, per its kind's completion mode
    async fn complete(&self, task: &Task) -> Result<(), TaskError> {
        match task.kind.completion() {
            Completion::Delete => self.store.delete(task.id).await,
            Completion::MarkProcessed => self.store.mark_processed(task.id).await,
        }
    }

    fn guard(&self, kind: TaskKind) -> Arc<Mutex<()>> {
        self.guards.entry(kind).or_default().value().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use serde_json::{Value, json};
    use tokio::sync::Notify;

    use super::*;
    use crate::scheduler::registry::TaskHandler;
    use crate::scheduler::store::MemoryTaskStore;
    use crate::scheduler::types::NewTask;

    fn scheduler_with(
        kind: TaskKind,
        handler: Arc<dyn TaskHandler>,
    ) -> (Arc<Scheduler>, Arc<MemoryTaskStore>) {
        let store = Arc::new(MemoryTaskStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(kind, handler).unwrap();
        let scheduler = Arc::new(Scheduler::new(store.clone(), registry));
        (scheduler, store)
    }

    fn due_task(kind: TaskKind, subject_id: i64) -> NewTask {
        NewTask::new(kind, subject_id, Utc::now() - TimeDelta::seconds(1))
    }

    /// Records every dispatched subject and payload
    #[derive(Default)]
    struct RecordingHandler {
        subjects: StdMutex<Vec<i64>>,
        payloads: StdMutex<Vec<Value>>,
    }

    #[async_trait]
    impl TaskHandler for RecordingHandler {
        async fn handle(&self, task: &Task) -> Result<(), TaskError> {
            self.subjects.lock().unwrap().push(task.subject_id);
            self.payloads
                .lock()
                .unwrap()
                .push(task.payload.clone().unwrap_or(Value::Null));
            Ok(())
        }
    }

    /// Always fails with the given error class
    struct FailingHandler {
        calls: AtomicUsize,
        missing_entity: bool,
    }

    #[async_trait]
    impl TaskHandler for FailingHandler {
        async fn handle(&self, _task: &Task) -> Result<(), TaskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.missing_entity {
                Err(TaskError::MissingEntity("user 42".to_string()))
            } else {
                Err(TaskError::Handler("boom".to_string()))
            }
        }
    }

    /// Parks inside `handle` until released, to hold a tick open
    struct ParkedHandler {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TaskHandler for ParkedHandler {
        async fn handle(&self, _task: &Task) -> Result<(), TaskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    /// Applies a side effect at most once per subject, like a real handler
    /// that checks "does the user still have the role" before acting
    #[derive(Default)]
    struct IdempotentHandler {
        calls: AtomicUsize,
        applied: StdMutex<HashSet<i64>>,
    }

    #[async_trait]
    impl TaskHandler for IdempotentHandler {
        async fn handle(&self, task: &Task) -> Result<(), TaskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Re-applying is a no-op, not an error
            self.applied.lock().unwrap().insert(task.subject_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_to_end_reminder() {
        let handler = Arc::new(RecordingHandler::default());
        let (scheduler, store) = scheduler_with(TaskKind::Reminder, handler.clone());

        store
            .insert(
                due_task(TaskKind::Reminder, 42).with_payload(json!({"message": "hello"})),
            )
            .await
            .unwrap();

        let outcome = scheduler.tick(TaskKind::Reminder).await.unwrap();

        assert_eq!(outcome.completed, 1);
        assert_eq!(*handler.subjects.lock().unwrap(), vec![42]);
        assert_eq!(
            *handler.payloads.lock().unwrap(),
            vec![json!({"message": "hello"})]
        );
        assert!(store.fetch_due(TaskKind::Reminder, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_future_tasks_are_not_dispatched() {
        let handler = Arc::new(RecordingHandler::default());
        let (scheduler, store) = scheduler_with(TaskKind::Reminder, handler.clone());

        store
            .insert(NewTask::new(
                TaskKind::Reminder,
                1,
                Utc::now() + TimeDelta::hours(1),
            ))
            .await
            .unwrap();

        let outcome = scheduler.tick(TaskKind::Reminder).await.unwrap();

        assert_eq!(outcome.completed, 0);
        assert!(handler.subjects.lock().unwrap().is_empty());
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_tasks_dispatch_in_creation_order() {
        let handler = Arc::new(RecordingHandler::default());
        let (scheduler, store) = scheduler_with(TaskKind::GiveawayEnd, handler.clone());

        for subject in [1, 2, 3] {
            store.insert(due_task(TaskKind::GiveawayEnd, subject)).await.unwrap();
        }

        let outcome = scheduler.tick(TaskKind::GiveawayEnd).await.unwrap();

        assert_eq!(outcome.completed, 3);
        assert_eq!(*handler.subjects.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_tick_is_skipped_not_queued() {
        let handler = Arc::new(ParkedHandler {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (scheduler, store) = scheduler_with(TaskKind::Reminder, handler.clone());

        store.insert(due_task(TaskKind::Reminder, 7)).await.unwrap();

        let first = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.tick(TaskKind::Reminder).await }
        });

        // Wait until the first tick is inside the handler, holding the guard
        handler.entered.notified().await;

        let second = scheduler.tick(TaskKind::Reminder).await.unwrap();
        assert!(second.skipped);
        assert_eq!(second.completed, 0);

        handler.release.notify_one();
        let first = first.await.unwrap().unwrap();

        // Exactly one handler invocation across both ticks
        assert_eq!(first.completed, 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_entity_drops_task_without_retry() {
        let handler = Arc::new(FailingHandler {
            calls: AtomicUsize::new(0),
            missing_entity: true,
        });
        let (scheduler, store) = scheduler_with(TaskKind::RepostPenalty, handler.clone());

        store.insert(due_task(TaskKind::RepostPenalty, 99)).await.unwrap();

        let outcome = scheduler.tick(TaskKind::RepostPenalty).await.unwrap();
        assert_eq!(outcome.dropped, 1);
        assert_eq!(store.row_count(), 0);

        // Bounded: a later tick finds nothing to do
        let outcome = scheduler.tick(TaskKind::RepostPenalty).await.unwrap();
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_error_retains_task_for_retry() {
        let handler = Arc::new(FailingHandler {
            calls: AtomicUsize::new(0),
            missing_entity: false,
        });
        let (scheduler, store) = scheduler_with(TaskKind::BurgerRot, handler.clone());

        store.insert(due_task(TaskKind::BurgerRot, 5)).await.unwrap();

        let outcome = scheduler.tick(TaskKind::BurgerRot).await.unwrap();
        assert_eq!(outcome.retained, 1);
        assert_eq!(store.row_count(), 1);

        // Still due, so the next tick retries it
        scheduler.tick(TaskKind::BurgerRot).await.unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repost_penalty_rows_are_flagged_not_deleted() {
        let handler = Arc::new(RecordingHandler::default());
        let (scheduler, store) = scheduler_with(TaskKind::RepostPenalty, handler.clone());

        store.insert(due_task(TaskKind::RepostPenalty, 12)).await.unwrap();

        let outcome = scheduler.tick(TaskKind::RepostPenalty).await.unwrap();
        assert_eq!(outcome.completed, 1);

        // Audit row survives but is no longer due
        assert_eq!(store.row_count(), 1);
        let outcome = scheduler.tick(TaskKind::RepostPenalty).await.unwrap();
        assert_eq!(outcome.completed, 0);
        assert_eq!(handler.subjects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_crash_between_handler_and_removal_recovers_idempotently() {
        let handler = Arc::new(IdempotentHandler::default());
        let (scheduler, store) = scheduler_with(TaskKind::RouletteTimeout, handler.clone());

        store.insert(due_task(TaskKind::RouletteTimeout, 42)).await.unwrap();

        // Handler succeeds, then the process "crashes" before row removal
        store.fail_next_delete();
        assert!(scheduler.tick(TaskKind::RouletteTimeout).await.is_err());
        assert_eq!(store.row_count(), 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        // The rerun re-dispatches, the handler no-ops, the row is cleared
        let outcome = scheduler.tick(TaskKind::RouletteTimeout).await.unwrap();
        assert_eq!(outcome.completed, 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(handler.applied.lock().unwrap().len(), 1);
        assert_eq!(store.row_count(), 0);
    }
}
