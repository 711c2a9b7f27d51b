use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::constants::{
    BURGER_POLL_INTERVAL, GIVEAWAY_POLL_INTERVAL, REMINDER_POLL_INTERVAL, REPOST_POLL_INTERVAL,
    ROULETTE_POLL_INTERVAL,
};
use crate::errors::TaskError;

/// Category of a scheduled task, determining which handler runs it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_kind", rename_all = "snake_case")]
pub enum TaskKind {
    Reminder,
    GiveawayEnd,
    RepostPenalty,
    RouletteTimeout,
    BurgerRot,
}

/// What to do with a task row once its handler has succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Remove the row
    Delete,
    /// Keep the row but flag it, preserving an audit trail
    MarkProcessed,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Reminder => "reminder",
            TaskKind::GiveawayEnd => "giveaway_end",
            TaskKind::RepostPenalty => "repost_penalty",
            TaskKind::RouletteTimeout => "roulette_timeout",
            TaskKind::BurgerRot => "burger_rot",
        }
    }

    /// How often the poller checks this kind for due tasks.
    ///
    /// Reminders and giveaways are user-visible to the second, so they poll
    /// fast; the day-scale kinds can afford a minute of slack.
    pub fn poll_interval(&self) -> Duration {
        match self {
            TaskKind::Reminder => REMINDER_POLL_INTERVAL,
            TaskKind::GiveawayEnd => GIVEAWAY_POLL_INTERVAL,
            TaskKind::RepostPenalty => REPOST_POLL_INTERVAL,
            TaskKind::RouletteTimeout => ROULETTE_POLL_INTERVAL,
            TaskKind::BurgerRot => BURGER_POLL_INTERVAL,
        }
    }

    /// Repost penalties keep their rows as an audit trail; every other kind
    /// deletes the row once handled.
    pub fn completion(&self) -> Completion {
        match self {
            TaskKind::RepostPenalty => Completion::MarkProcessed,
            _ => Completion::Delete,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending expiration, as stored
#[derive(Debug, Clone)]
pub struct Task {
    pub id: i32,
    pub kind: TaskKind,
    /// Id of the entity the task concerns (a user or message snowflake)
    pub subject_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payload: Option<Value>,
    pub processed: bool,
}

impl Task {
    /// Whether the task should be dispatched at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.processed && self.expires_at <= now
    }

    /// Deserialize the kind-specific payload.
    ///
    /// A missing payload fails deserialization just like a malformed one;
    /// either way the task can never succeed and is dropped by the poller.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, TaskError> {
        let value = self.payload.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}

/// A task waiting to be inserted into the store
#[derive(Debug, Clone)]
pub struct NewTask {
    pub kind: TaskKind,
    pub subject_id: i64,
    pub expires_at: DateTime<Utc>,
    pub payload: Option<Value>,
}

impl NewTask {
    pub fn new(kind: TaskKind, subject_id: i64, expires_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            subject_id,
            expires_at,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn task(expires_at: DateTime<Utc>, processed: bool) -> Task {
        Task {
            id: 1,
            kind: TaskKind::Reminder,
            subject_id: 42,
            created_at: Utc::now() - TimeDelta::minutes(5),
            expires_at,
            payload: None,
            processed,
        }
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();

        // Expired and unprocessed
        assert!(task(now - TimeDelta::seconds(1), false).is_due(now));

        // Expiring exactly now counts as due
        assert!(task(now, false).is_due(now));

        // Not yet expired
        assert!(!task(now + TimeDelta::seconds(1), false).is_due(now));

        // Already processed rows are never due again
        assert!(!task(now - TimeDelta::hours(1), true).is_due(now));
    }

    #[test]
    fn test_completion_modes() {
        assert_eq!(TaskKind::RepostPenalty.completion(), Completion::MarkProcessed);

        for kind in [
            TaskKind::Reminder,
            TaskKind::GiveawayEnd,
            TaskKind::RouletteTimeout,
            TaskKind::BurgerRot,
        ] {
            assert_eq!(kind.completion(), Completion::Delete);
        }
    }

    #[test]
    fn test_decode_missing_payload_fails() {
        let task = task(Utc::now(), false);
        let decoded: Result<std::collections::HashMap<String, String>, _> =
            task.decode_payload();
        // HashMap would accept `{}` but not `null`
        assert!(decoded.is_err());
    }
}
