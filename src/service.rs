//! Task-submission services and the decorator that records their outcomes.

use std::time::Duration;

use crate::counts::CategoryKey;
use crate::error::ServiceError;
use crate::models::{Completion, TaskId};
use crate::recorder::Recorder;
use crate::snapshot::Snapshot;
use crate::task::{Classify, RecordingTask, RunnableTask, Task, Uncategorized};

/// Accepts tasks and hands back their completions in the order they finish.
pub trait CompletionService {
    type Output;
    type Error;

    fn submit<W>(&self, task: W) -> Result<TaskId, ServiceError>
    where
        W: Task<Output = Self::Output, Error = Self::Error> + Send + 'static;

    /// Submits work that cannot fail; `value` is its result.
    fn submit_runnable<R>(&self, runnable: R, value: Self::Output) -> Result<TaskId, ServiceError>
    where
        R: FnOnce() + Send + 'static,
        Self::Output: Send + 'static,
        Self::Error: Send + 'static,
    {
        self.submit(RunnableTask::new(runnable, value))
    }

    /// Blocks until a task completes.
    fn take(&self) -> Result<Completion<Self::Output, Self::Error>, ServiceError>;

    fn poll(&self) -> Option<Completion<Self::Output, Self::Error>>;

    /// `Ok(None)` if nothing completed within `timeout`.
    fn poll_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Completion<Self::Output, Self::Error>>, ServiceError>;
}

/// Wraps another [`CompletionService`] and records the outcome of every
/// task submitted through it.
///
/// Each instance owns its own [`Recorder`]; [`take_snapshot`](Self::take_snapshot)
/// reports everything that has finished so far.
pub struct RecordingCompletionService<S, K: CategoryKey, C = Uncategorized> {
    delegate: S,
    recorder: Recorder<K>,
    classifier: C,
}

impl<S, K: CategoryKey> RecordingCompletionService<S, K, Uncategorized> {
    pub fn new(delegate: S) -> Self {
        Self::with_classifier(delegate, Uncategorized)
    }
}

impl<S, K: CategoryKey, C> RecordingCompletionService<S, K, C> {
    pub fn with_classifier(delegate: S, classifier: C) -> Self {
        Self {
            delegate,
            recorder: Recorder::new(),
            classifier,
        }
    }

    pub fn take_snapshot(&self) -> Snapshot<K> {
        self.recorder.take_snapshot()
    }

    pub fn delegate(&self) -> &S {
        &self.delegate
    }

    pub fn into_inner(self) -> S {
        self.delegate
    }
}

impl<S, K, C> CompletionService for RecordingCompletionService<S, K, C>
where
    S: CompletionService,
    K: CategoryKey + Send + Sync + 'static,
    C: Classify<S::Error, K> + Clone + Send + 'static,
{
    type Output = S::Output;
    type Error = S::Error;

    fn submit<W>(&self, task: W) -> Result<TaskId, ServiceError>
    where
        W: Task<Output = S::Output, Error = S::Error> + Send + 'static,
    {
        self.delegate.submit(RecordingTask::with_classifier(
            &self.recorder,
            task,
            self.classifier.clone(),
        ))
    }

    #[inline]
    fn take(&self) -> Result<Completion<S::Output, S::Error>, ServiceError> {
        self.delegate.take()
    }

    #[inline]
    fn poll(&self) -> Option<Completion<S::Output, S::Error>> {
        self.delegate.poll()
    }

    #[inline]
    fn poll_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Completion<S::Output, S::Error>>, ServiceError> {
        self.delegate.poll_timeout(timeout)
    }
}
