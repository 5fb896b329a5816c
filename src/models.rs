use serde::Serialize;
use std::any::Any;
use thiserror::Error;

/// Handle returned by `submit`, echoed back on the matching completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u64);

#[derive(Debug, Error)]
pub enum TaskFailure<E> {
    #[error("task failed")]
    Failed(E),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> TaskFailure<E> {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskFailure::Panicked(message)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed,
    Panicked,
}

/// A finished task: its id and what it produced.
#[derive(Debug)]
pub struct Completion<T, E> {
    id: TaskId,
    outcome: Result<T, TaskFailure<E>>,
}

impl<T, E> Completion<T, E> {
    #[inline]
    pub fn new(id: TaskId, outcome: Result<T, TaskFailure<E>>) -> Self {
        Self { id, outcome }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn status(&self) -> CompletionStatus {
        match self.outcome {
            Ok(_) => CompletionStatus::Completed,
            Err(TaskFailure::Failed(_)) => CompletionStatus::Failed,
            Err(TaskFailure::Panicked(_)) => CompletionStatus::Panicked,
        }
    }

    pub fn outcome(&self) -> &Result<T, TaskFailure<E>> {
        &self.outcome
    }

    pub fn into_result(self) -> Result<T, TaskFailure<E>> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_messages_are_kept() {
        let from_str = TaskFailure::<()>::from_panic(Box::new("boom"));
        assert!(matches!(from_str, TaskFailure::Panicked(ref m) if m == "boom"));

        let from_string = TaskFailure::<()>::from_panic(Box::new(String::from("bang")));
        assert!(matches!(from_string, TaskFailure::Panicked(ref m) if m == "bang"));

        let opaque = TaskFailure::<()>::from_panic(Box::new(17u8));
        assert!(matches!(opaque, TaskFailure::Panicked(_)));
    }

    #[test]
    fn completion_status_follows_outcome() {
        let ok = Completion::<u8, ()>::new(TaskId(1), Ok(3));
        assert!(ok.is_success());
        assert_eq!(ok.status(), CompletionStatus::Completed);

        let failed = Completion::<u8, &str>::new(TaskId(2), Err(TaskFailure::Failed("nope")));
        assert_eq!(failed.status(), CompletionStatus::Failed);
        assert_eq!(failed.id(), TaskId(2));
        assert!(matches!(failed.into_result(), Err(TaskFailure::Failed("nope"))));
    }

    #[test]
    fn ids_and_statuses_serialize_for_reports() {
        assert_eq!(serde_json::to_string(&TaskId(12)).unwrap(), "12");
        assert_eq!(
            serde_json::to_string(&CompletionStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::to_string(&CompletionStatus::Panicked).unwrap(),
            "\"panicked\""
        );
    }
}
