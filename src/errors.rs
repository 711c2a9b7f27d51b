use serenity::http::HttpError;
use thiserror::Error;

use crate::scheduler::TaskKind;

/// Errors produced while storing, routing or running scheduled tasks.
///
/// The scheduler only cares about the broad class of a failure (see
/// `scheduler::policy`): malformed payloads and vanished platform entities
/// can never succeed and get their row dropped, everything else leaves the
/// row in place for a later tick.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no handler registered for {0} tasks")]
    NoHandler(TaskKind),

    #[error("a handler for {0} tasks is already registered")]
    DuplicateHandler(TaskKind),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("discord api error: {0}")]
    Discord(#[source] Box<serenity::Error>),

    #[error("{0} no longer exists")]
    MissingEntity(String),

    #[error("malformed task payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("{0}")]
    Handler(String),
}

impl TaskError {
    /// Classify a Discord API error for a lookup of `what`.
    ///
    /// A 404 means the referenced entity is permanently gone and the task
    /// can never complete; anything else is treated as transient.
    pub fn from_discord(err: serenity::Error, what: impl Into<String>) -> Self {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)) = err {
            if response.status_code.as_u16() == 404 {
                return TaskError::MissingEntity(what.into());
            }
        }
        TaskError::Discord(Box::new(err))
    }
}
