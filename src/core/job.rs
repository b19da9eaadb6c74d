//! The schedulable unit of work.
//!
//! A [`Job`] owns its entry point and a small amount of scheduling metadata.
//! Jobs are moved into exactly one enqueue call and consumed by whichever
//! backend runs them, so "null" and "enqueued twice" are not representable.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::executor_ref::ExecutorRef;

/// Process-unique job identifier.
pub type JobId = u64;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Priority class attached to a job.
///
/// Comparison, ordering and hashing treat `Unspecified` as `Default`, which
/// ranks between `Utility` and `UserInitiated`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    /// No priority requested; scheduled as [`JobPriority::Default`].
    #[default]
    Unspecified,
    /// Maintenance or prefetching work.
    Background,
    /// Long-running work the user is not actively waiting on.
    Utility,
    /// Normal work.
    Default,
    /// Work the user started and is waiting on.
    UserInitiated,
    /// Work needed to keep the interface responsive.
    UserInteractive,
}

impl JobPriority {
    /// Priority used for ordering, with `Unspecified` folded into `Default`.
    #[must_use]
    pub const fn effective(self) -> Self {
        match self {
            Self::Unspecified => Self::Default,
            other => other,
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Utility => 1,
            Self::Unspecified | Self::Default => 2,
            Self::UserInitiated => 3,
            Self::UserInteractive => 4,
        }
    }
}

impl PartialEq for JobPriority {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl Eq for JobPriority {}

impl Hash for JobPriority {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
    }
}

impl PartialOrd for JobPriority {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for JobPriority {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.rank().cmp(&other.rank())
    }
}

/// Scheduling metadata carried by a job. The executor never mutates it.
#[derive(Debug, Clone)]
pub struct JobMetadata {
    /// Unique identifier, used in trace events.
    pub id: JobId,
    /// Priority class.
    pub priority: JobPriority,
    /// Executor the producer associated with this job, if any.
    pub executor: Option<ExecutorRef>,
}

type Entry = Box<dyn FnOnce() + Send + 'static>;

/// A ready-to-run unit of work.
pub struct Job {
    meta: JobMetadata,
    entry: Option<Entry>,
}

impl Job {
    /// Create a job with default priority.
    pub fn new<F>(entry: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_priority(JobPriority::Unspecified, entry)
    }

    /// Create a job with an explicit priority.
    pub fn with_priority<F>(priority: JobPriority, entry: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            meta: JobMetadata {
                id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
                priority,
                executor: None,
            },
            entry: Some(Box::new(entry)),
        }
    }

    /// Associate the job with a target executor.
    #[must_use]
    pub fn on_executor(mut self, executor: ExecutorRef) -> Self {
        self.meta.executor = Some(executor);
        self
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.meta.id
    }

    /// Job priority.
    #[must_use]
    pub const fn priority(&self) -> JobPriority {
        self.meta.priority
    }

    /// Scheduling metadata.
    #[must_use]
    pub const fn metadata(&self) -> &JobMetadata {
        &self.meta
    }

    /// Invoke the entry point, consuming the job.
    pub fn run(mut self) {
        if let Some(entry) = self.entry.take() {
            trace!(job_id = self.meta.id, "running job");
            entry();
        }
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if self.entry.is_some() {
            trace!(job_id = self.meta.id, "job retired without running");
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.meta.id)
            .field("priority", &self.meta.priority)
            .field("executor", &self.meta.executor)
            .finish_non_exhaustive()
    }
}
