//! Scheduling engines behind the enqueue API.
//!
//! Exactly one [`Backend`] serves a [`GlobalExecutor`](crate::core::GlobalExecutor).
//! Three engines are provided:
//!
//! - [`CooperativeBackend`]: single logical thread, driven by draining the
//!   main queue; for environments without thread pools.
//! - [`DispatchBackend`] (feature `tokio-runtime`): hands work to a
//!   multi-threaded tokio runtime and its timers.
//! - [`ThreadPoolBackend`]: fixed worker threads, a channel and a timer
//!   thread; the portable fallback.
//!
//! All engines share the same guarantees: immediate jobs eventually run,
//! delayed jobs never start before their delay has elapsed, and main jobs run
//! one at a time in enqueue order on the thread that drains the main queue.

pub mod cooperative;
#[cfg(feature = "tokio-runtime")]
pub mod dispatch;
pub mod main_queue;
pub mod thread_pool;
mod timer;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::{Deadline, ExecutorRef, Job, JobDelay, SchedulerError};

pub use cooperative::CooperativeBackend;
#[cfg(feature = "tokio-runtime")]
pub use dispatch::DispatchBackend;
pub use main_queue::MainQueue;
pub use thread_pool::ThreadPoolBackend;

/// Engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Single-threaded cooperative run loop.
    Cooperative,
    /// Native concurrent runtime (tokio).
    Dispatch,
    /// Portable thread pool with a timer thread.
    ThreadPool,
}

impl BackendKind {
    /// Engine selected by this build's features.
    #[must_use]
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "cooperative") {
            Self::Cooperative
        } else if cfg!(feature = "tokio-runtime") {
            Self::Dispatch
        } else {
            Self::ThreadPool
        }
    }

    /// Whether this engine is compiled into the build.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::Cooperative | Self::ThreadPool => true,
            Self::Dispatch => cfg!(feature = "tokio-runtime"),
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::Dispatch => "dispatch",
            Self::ThreadPool => "thread_pool",
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::compiled_default()
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cooperative" => Ok(Self::Cooperative),
            "dispatch" => Ok(Self::Dispatch),
            "thread_pool" | "threadpool" | "pool" => Ok(Self::ThreadPool),
            other => Err(SchedulerError::InvalidConfig(format!(
                "unknown backend `{other}`"
            ))),
        }
    }
}

/// How long [`Backend::drain_main_queue`] keeps the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Run what is runnable, return once nothing is left to run.
    UntilIdle,
    /// Run jobs as they arrive until the backend shuts down.
    Forever,
    /// Run jobs as they arrive for at most this long.
    For(Duration),
}

/// Statistics about a backend.
#[derive(Debug, Clone, Default)]
pub struct BackendStats {
    /// Engine name.
    pub backend: &'static str,
    /// Worker threads owned by the engine (zero for cooperative).
    pub worker_count: usize,
    /// Jobs accepted for immediate global execution.
    pub submitted_jobs: u64,
    /// Jobs accepted with a delay or deadline.
    pub delayed_jobs: u64,
    /// Jobs accepted for the main queue.
    pub main_jobs: u64,
    /// Jobs that ran to completion.
    pub completed_jobs: u64,
    /// Jobs that panicked.
    pub failed_jobs: u64,
}

/// Internal counters for backend statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct BackendCounters {
    pub submitted_jobs: AtomicU64,
    pub delayed_jobs: AtomicU64,
    pub main_jobs: AtomicU64,
    pub completed_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
}

impl BackendCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, backend: BackendKind, worker_count: usize) -> BackendStats {
        BackendStats {
            backend: backend.as_str(),
            worker_count,
            submitted_jobs: self.submitted_jobs.load(Ordering::Relaxed),
            delayed_jobs: self.delayed_jobs.load(Ordering::Relaxed),
            main_jobs: self.main_jobs.load(Ordering::Relaxed),
            completed_jobs: self.completed_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
        }
    }
}

/// Run a job, containing a panic so the calling thread survives.
pub(crate) fn run_job(job: Job, counters: &BackendCounters) {
    let job_id = job.id();
    match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
        Ok(()) => {
            counters.completed_jobs.fetch_add(1, Ordering::Relaxed);
        }
        Err(_) => {
            counters.failed_jobs.fetch_add(1, Ordering::Relaxed);
            error!(job_id = job_id, "job panicked");
        }
    }
}

/// Contract every scheduling engine implements.
///
/// Enqueue methods never block and never run the job on the calling thread.
pub trait Backend: Send + Sync {
    /// Which engine this is.
    fn kind(&self) -> BackendKind;

    /// Run `job` as soon as the engine can.
    fn enqueue_global(&self, job: Job);

    /// Run `job` no earlier than `delay` from now. Zero is immediate.
    fn enqueue_global_with_delay(&self, delay: JobDelay, job: Job);

    /// Run `job` no earlier than `deadline`.
    fn enqueue_global_with_deadline(&self, deadline: Deadline, job: Job) {
        self.enqueue_global_with_delay(deadline.to_delay(), job);
    }

    /// Run `job` on the built-in main executor, after every main job
    /// enqueued before it.
    fn enqueue_main(&self, job: Job);

    /// The engine's built-in main executor.
    fn main_executor(&self) -> ExecutorRef;

    /// Notification that the main executor has been replaced.
    fn set_main_executor_override(&self, executor: &ExecutorRef) {
        info!(
            backend = self.kind().as_str(),
            identity = executor.identity().as_raw(),
            "main executor override installed"
        );
    }

    /// Hand the calling thread to the main queue.
    ///
    /// Returns the number of jobs run.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NotMainThread`] if another thread already drains the
    /// main queue; [`SchedulerError::Shutdown`] after shutdown.
    fn drain_main_queue(&self, mode: DrainMode) -> Result<usize, SchedulerError>;

    /// Current statistics.
    fn stats(&self) -> BackendStats;

    /// Stop accepting work and release threads.
    fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("cooperative".parse::<BackendKind>().unwrap(), BackendKind::Cooperative);
        assert_eq!(" Dispatch ".parse::<BackendKind>().unwrap(), BackendKind::Dispatch);
        assert_eq!("thread_pool".parse::<BackendKind>().unwrap(), BackendKind::ThreadPool);
        assert!("gcd".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_compiled_default_is_available() {
        assert!(BackendKind::compiled_default().is_available());
        assert!(BackendKind::ThreadPool.is_available());
    }

    #[test]
    fn test_run_job_counts_panics() {
        let counters = BackendCounters::default();
        run_job(Job::new(|| {}), &counters);
        run_job(Job::new(|| panic!("boom")), &counters);
        let stats = counters.snapshot(BackendKind::ThreadPool, 2);
        assert_eq!(stats.completed_jobs, 1);
        assert_eq!(stats.failed_jobs, 1);
        assert_eq!(stats.backend, "thread_pool");
    }
}
