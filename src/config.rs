use log::warn;
use std::env;

pub const WORKERS_ENV: &str = "TASKSTATS_WORKERS";
pub const QUEUE_CAPACITY_ENV: &str = "TASKSTATS_QUEUE_CAPACITY";

/// Sizing for [`ThreadPoolCompletionService`](crate::ThreadPoolCompletionService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let worker_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            worker_count,
            queue_capacity: worker_count * 10,
            thread_name_prefix: "taskstats-worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Defaults, overridden by `TASKSTATS_WORKERS` and `TASKSTATS_QUEUE_CAPACITY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(workers) = positive(WORKERS_ENV, lookup(WORKERS_ENV)) {
            config.worker_count = workers;
            config.queue_capacity = workers * 10;
        }
        if let Some(capacity) = positive(QUEUE_CAPACITY_ENV, lookup(QUEUE_CAPACITY_ENV)) {
            config.queue_capacity = capacity;
        }

        config
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

fn positive(key: &str, raw: Option<String>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!("ignoring {}={:?}: expected a positive integer", key, raw);
            None
        }
    }
}
