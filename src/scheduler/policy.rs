//! Pure failure-disposition policy for the task poller (Discord-agnostic)

use crate::errors::TaskError;

/// What the poller does with a task row whose handler failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The failure can never resolve itself - drop the row and log
    Delete,
    /// The failure may be temporary - leave the row for the next tick
    Retain,
}

/// Decide the fate of a failed task.
///
/// Missing entities and malformed payloads can never succeed, so retrying
/// them forever would only spam the log; everything else is kept so that a
/// user-facing effect is delayed rather than silently lost.
pub fn disposition(err: &TaskError) -> Disposition {
    match err {
        TaskError::MissingEntity(_) | TaskError::Payload(_) => Disposition::Delete,
        TaskError::NoHandler(_)
        | TaskError::DuplicateHandler(_)
        | TaskError::Database(_)
        | TaskError::Discord(_)
        | TaskError::Handler(_) => Disposition::Retain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskKind;

    fn payload_error() -> TaskError {
        serde_json::from_str::<u64>("not json").map_err(TaskError::from).unwrap_err()
    }

    #[test]
    fn test_unresolvable_failures_are_dropped() {
        assert_eq!(
            disposition(&TaskError::MissingEntity("channel 123".to_string())),
            Disposition::Delete
        );
        assert_eq!(disposition(&payload_error()), Disposition::Delete);
    }

    #[test]
    fn test_retryable_failures_are_retained() {
        assert_eq!(
            disposition(&TaskError::Database(sqlx::Error::PoolTimedOut)),
            Disposition::Retain
        );
        assert_eq!(
            disposition(&TaskError::Handler("draw failed".to_string())),
            Disposition::Retain
        );
        assert_eq!(
            disposition(&TaskError::NoHandler(TaskKind::Reminder)),
            Disposition::Retain
        );
    }
}
