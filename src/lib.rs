//! Thread-safe recording of task successes and failures.
//!
//! A [`Recorder`] counts outcomes and hands out immutable [`Snapshot`]s,
//! optionally breaking errors down by a caller-chosen category key. Snapshots
//! from different recorders or points in time combine with
//! [`Snapshot::merge_with`]. [`RecordingTask`] and
//! [`RecordingCompletionService`] record outcomes automatically around
//! existing work.

pub mod config;
pub mod counts;
pub mod error;
pub mod models;
pub mod pool;
pub mod recorder;
pub mod report;
pub mod service;
pub mod snapshot;
pub mod task;

pub use config::PoolConfig;
pub use counts::{CategoryKey, ErrorBreakdown, SuccessCount};
pub use error::{ServiceError, StatsError};
pub use models::{Completion, CompletionStatus, TaskFailure, TaskId};
pub use pool::ThreadPoolCompletionService;
pub use recorder::Recorder;
pub use report::print_snapshot_report;
pub use service::{CompletionService, RecordingCompletionService};
pub use snapshot::Snapshot;
pub use task::{Classifier, Classify, ErrorCategory, RecordingTask, RunnableTask, Task, Uncategorized};
