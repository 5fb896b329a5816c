use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::error::ServiceError;
use crate::models::{Completion, TaskFailure, TaskId};
use crate::service::CompletionService;
use crate::task::Task;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Inlets<T, E> {
    jobs: Sender<Job>,
    completions: Sender<Completion<T, E>>,
}

/// [`CompletionService`] backed by a fixed pool of worker threads.
///
/// Jobs go through a bounded queue, so `submit` blocks while the queue is
/// full. Completions are delivered in the order tasks finish.
pub struct ThreadPoolCompletionService<T, E> {
    inlets: Mutex<Option<Inlets<T, E>>>,
    completions: Receiver<Completion<T, E>>,
    next_id: AtomicU64,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl<T, E> ThreadPoolCompletionService<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new(config: PoolConfig) -> Result<Self, ServiceError> {
        let (job_tx, job_rx) = bounded::<Job>(config.queue_capacity);
        let (completion_tx, completion_rx) = unbounded();

        let workers = spawn_workers(&config, job_rx)?;
        debug!(
            "Completion service started with {} workers (queue capacity {})",
            workers.len(),
            config.queue_capacity
        );

        Ok(Self {
            inlets: Mutex::new(Some(Inlets {
                jobs: job_tx,
                completions: completion_tx,
            })),
            completions: completion_rx,
            next_id: AtomicU64::new(0),
            workers: Mutex::new(workers),
        })
    }

    /// Stops accepting work, lets queued tasks finish and joins the workers.
    ///
    /// Completions already produced can still be retrieved afterwards.
    pub fn shutdown(&self) {
        if self.inlets.lock().take().is_none() {
            return;
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            let _ = handle.join();
        }
        debug!("Completion service shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inlets.lock().is_none()
    }
}

impl<T, E> CompletionService for ThreadPoolCompletionService<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn submit<W>(&self, task: W) -> Result<TaskId, ServiceError>
    where
        W: Task<Output = T, Error = E> + Send + 'static,
    {
        let (jobs, completions) = match self.inlets.lock().as_ref() {
            Some(inlets) => (inlets.jobs.clone(), inlets.completions.clone()),
            None => return Err(ServiceError::ShutDown),
        };

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let job: Job = Box::new(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
                Ok(result) => result.map_err(TaskFailure::Failed),
                Err(payload) => {
                    let failure = TaskFailure::from_panic(payload);
                    if let TaskFailure::Panicked(ref message) = failure {
                        warn!("Task {} panicked: {}", id.0, message);
                    }
                    Err(failure)
                }
            };
            let _ = completions.send(Completion::new(id, outcome));
        });

        jobs.send(job).map_err(|_| ServiceError::ShutDown)?;
        Ok(id)
    }

    fn take(&self) -> Result<Completion<T, E>, ServiceError> {
        self.completions
            .recv()
            .map_err(|_| ServiceError::Disconnected)
    }

    fn poll(&self) -> Option<Completion<T, E>> {
        self.completions.try_recv().ok()
    }

    fn poll_timeout(&self, timeout: Duration) -> Result<Option<Completion<T, E>>, ServiceError> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Ok(Some(completion)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ServiceError::Disconnected),
        }
    }
}

impl<T, E> Drop for ThreadPoolCompletionService<T, E> {
    fn drop(&mut self) {
        if self.inlets.get_mut().take().is_some() {
            for handle in self.workers.get_mut().drain(..) {
                let _ = handle.join();
            }
        }
    }
}

fn spawn_workers(
    config: &PoolConfig,
    jobs: Receiver<Job>,
) -> Result<Vec<thread::JoinHandle<()>>, ServiceError> {
    (0..config.worker_count.max(1))
        .map(|worker_id| {
            let rx = jobs.clone();

            thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, worker_id))
                .spawn(move || run_worker(worker_id, rx))
                .map_err(ServiceError::from)
        })
        .collect()
}

fn run_worker(worker_id: usize, jobs: Receiver<Job>) {
    debug!("Worker {} started", worker_id);

    while let Ok(job) = jobs.recv() {
        job();
    }

    debug!("Worker {} shutting down", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RecordingCompletionService;
    use crate::task::{Classifier, ErrorCategory};
    use std::collections::HashSet;

    #[derive(Debug, PartialEq, Eq)]
    enum JobError {
        Io,
        Parse,
    }

    fn config(workers: usize) -> PoolConfig {
        PoolConfig::default()
            .with_workers(workers)
            .with_queue_capacity(16)
            .with_thread_name_prefix("test-worker")
    }

    fn ok(value: u32) -> impl FnOnce() -> Result<u32, JobError> + Send + 'static {
        move || Ok(value)
    }

    fn fail(error: JobError) -> impl FnOnce() -> Result<u32, JobError> + Send + 'static {
        move || Err(error)
    }

    #[test]
    fn completions_carry_submitted_ids() {
        let service = ThreadPoolCompletionService::new(config(3)).unwrap();
        let submitted: HashSet<TaskId> = (0..20).map(|n| service.submit(ok(n)).unwrap()).collect();

        let completed: HashSet<TaskId> = (0..20).map(|_| service.take().unwrap().id()).collect();
        assert_eq!(submitted, completed);
        assert!(service.poll().is_none());
    }

    #[test]
    fn failures_and_panics_are_reported() {
        let service = ThreadPoolCompletionService::new(config(2)).unwrap();
        service.submit(fail(JobError::Parse)).unwrap();
        service
            .submit(|| -> Result<u32, JobError> { panic!("bad input") })
            .unwrap();

        let mut outcomes: Vec<_> = (0..2).map(|_| service.take().unwrap().into_result()).collect();
        outcomes.sort_by_key(|outcome| matches!(outcome, Err(TaskFailure::Panicked(_))));

        assert!(matches!(outcomes[0], Err(TaskFailure::Failed(JobError::Parse))));
        assert!(matches!(outcomes[1], Err(TaskFailure::Panicked(ref m)) if m == "bad input"));
    }

    #[test]
    fn poll_timeout_returns_none_when_idle() {
        let service = ThreadPoolCompletionService::<u32, JobError>::new(config(1)).unwrap();
        assert!(service
            .poll_timeout(Duration::from_millis(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn submit_after_shutdown_is_rejected() {
        let service = ThreadPoolCompletionService::new(config(2)).unwrap();
        service.submit(ok(1)).unwrap();
        service.shutdown();

        assert!(service.is_shut_down());
        assert!(matches!(service.submit(ok(2)), Err(ServiceError::ShutDown)));
        assert_eq!(service.take().unwrap().into_result().ok(), Some(1));
        assert!(matches!(service.take(), Err(ServiceError::Disconnected)));
        assert!(matches!(
            service.poll_timeout(Duration::from_millis(1)),
            Err(ServiceError::Disconnected)
        ));
    }

    #[test]
    fn recording_decorator_over_thread_pool() {
        let pool = ThreadPoolCompletionService::new(config(4)).unwrap();
        let service = RecordingCompletionService::<_, ErrorCategory>::new(pool);

        for n in 0..30 {
            match n % 5 {
                0 => service.submit(fail(JobError::Io)).unwrap(),
                1 => service
                    .submit(|| -> Result<u32, JobError> { panic!("task {} blew up", 1) })
                    .unwrap(),
                _ => service.submit(ok(n)).unwrap(),
            };
        }
        for _ in 0..30 {
            service.take().unwrap();
        }

        let snap = service.take_snapshot();
        assert_eq!(snap.success_count(), 18);
        assert_eq!(snap.uncategorized_error_count(), 12);
        assert_eq!(snap.event_count(), 30);
    }

    #[test]
    fn classified_recording_over_thread_pool() {
        let pool = ThreadPoolCompletionService::new(config(4)).unwrap();
        let classifier = Classifier::new(|error: &JobError| match error {
            JobError::Io => "io",
            JobError::Parse => "parse",
        });
        let service = RecordingCompletionService::with_classifier(pool, classifier);

        for _ in 0..3 {
            service.submit(fail(JobError::Io)).unwrap();
        }
        service.submit(fail(JobError::Parse)).unwrap();
        service.submit(ok(1)).unwrap();
        for _ in 0..5 {
            service.take().unwrap();
        }

        let snap = service.take_snapshot();
        assert_eq!(snap.error_count_for(&"io"), 3);
        assert_eq!(snap.error_count_for(&"parse"), 1);
        assert_eq!(snap.success_count(), 1);
        assert_eq!(snap.total_error_count(), 4);
    }

    #[test]
    fn concurrent_submitters_are_all_counted() {
        let pool = ThreadPoolCompletionService::new(config(4)).unwrap();
        let service = RecordingCompletionService::<_, ErrorCategory>::new(pool);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for n in 0..50 {
                        if n % 10 == 0 {
                            service.submit(fail(JobError::Io)).unwrap();
                        } else {
                            service.submit(ok(n)).unwrap();
                        }
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..400 {
                    service.take().unwrap();
                }
            });
        });

        let snap = service.take_snapshot();
        assert_eq!(snap.success_count(), 360);
        assert_eq!(snap.uncategorized_error_count(), 40);
    }
}
