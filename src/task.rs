//! Unit-of-work abstraction and the decorator that records its outcome.

use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::counts::CategoryKey;
use crate::recorder::Recorder;

/// A unit of work that either produces a value or fails.
pub trait Task {
    type Output;
    type Error;

    fn run(self) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Task for F
where
    F: FnOnce() -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    #[inline]
    fn run(self) -> Result<T, E> {
        self()
    }
}

/// Work that cannot fail, paired with the value to report once it has run.
pub struct RunnableTask<R, T, E> {
    runnable: R,
    value: T,
    _error: PhantomData<fn() -> E>,
}

impl<R, T, E> RunnableTask<R, T, E>
where
    R: FnOnce(),
{
    pub fn new(runnable: R, value: T) -> Self {
        Self {
            runnable,
            value,
            _error: PhantomData,
        }
    }
}

impl<R, T, E> Task for RunnableTask<R, T, E>
where
    R: FnOnce(),
{
    type Output = T;
    type Error = E;

    fn run(self) -> Result<T, E> {
        (self.runnable)();
        Ok(self.value)
    }
}

/// Picks the category an error is recorded under; `None` means uncategorized.
pub trait Classify<E, K> {
    fn classify(&self, error: &E) -> Option<K>;
}

/// Records every error as uncategorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncategorized;

impl<E, K> Classify<E, K> for Uncategorized {
    #[inline]
    fn classify(&self, _error: &E) -> Option<K> {
        None
    }
}

/// Records every error under the key returned by a closure.
pub struct Classifier<F> {
    classify: Arc<F>,
}

impl<F> Classifier<F> {
    pub fn new(classify: F) -> Self {
        Self {
            classify: Arc::new(classify),
        }
    }
}

impl<E> Classifier<fn(&E) -> ErrorCategory> {
    /// Categorizes by the error's type name.
    pub fn by_type() -> Self {
        Self::new(ErrorCategory::of_val::<E>)
    }
}

impl<F> Clone for Classifier<F> {
    fn clone(&self) -> Self {
        Self {
            classify: Arc::clone(&self.classify),
        }
    }
}

impl<E, K, F> Classify<E, K> for Classifier<F>
where
    F: Fn(&E) -> K,
{
    #[inline]
    fn classify(&self, error: &E) -> Option<K> {
        Some((self.classify)(error))
    }
}

/// Category key naming an error's Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ErrorCategory(&'static str);

impl ErrorCategory {
    pub fn of<E: ?Sized>() -> Self {
        Self(std::any::type_name::<E>())
    }

    pub fn of_val<E: ?Sized>(_error: &E) -> Self {
        Self::of::<E>()
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Wraps a [`Task`] and records its outcome into a [`Recorder`].
///
/// The wrapped task's result is handed back untouched. A panic is recorded as
/// an uncategorized error, even when a [`Classifier`] is set, and then resumed
/// with its original payload.
pub struct RecordingTask<T, K: CategoryKey, C = Uncategorized> {
    recorder: Recorder<K>,
    task: T,
    classifier: C,
}

impl<T, K: CategoryKey> RecordingTask<T, K, Uncategorized> {
    pub fn new(recorder: &Recorder<K>, task: T) -> Self {
        Self::with_classifier(recorder, task, Uncategorized)
    }
}

impl<T, K: CategoryKey, C> RecordingTask<T, K, C> {
    pub fn with_classifier(recorder: &Recorder<K>, task: T, classifier: C) -> Self {
        Self {
            recorder: recorder.clone_handle(),
            task,
            classifier,
        }
    }
}

impl<T, K, C> Task for RecordingTask<T, K, C>
where
    T: Task,
    K: CategoryKey,
    C: Classify<T::Error, K>,
{
    type Output = T::Output;
    type Error = T::Error;

    fn run(self) -> Result<T::Output, T::Error> {
        let Self {
            recorder,
            task,
            classifier,
        } = self;

        match panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
            Ok(Ok(value)) => {
                recorder.record_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                match classifier.classify(&error) {
                    Some(category) => recorder.record_error(category),
                    None => recorder.record_uncategorized_error(),
                }
                Err(error)
            }
            Err(payload) => {
                recorder.record_uncategorized_error();
                panic::resume_unwind(payload)
            }
        }
    }
}
