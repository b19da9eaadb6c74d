//! Concurrent engine backed by a multi-threaded tokio runtime.
//!
//! Immediate jobs are spawned onto the runtime, delayed jobs sleep until
//! their start time on the runtime's timer, and main jobs go to the shared
//! [`MainQueue`]. There is no ordering between global jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::core::{ExecutorRef, Job, JobDelay, SchedulerError};

use super::main_queue::MainQueue;
use super::timer::start_time;
use super::{run_job, Backend, BackendCounters, BackendKind, BackendStats, DrainMode};

/// Dispatch backend.
pub struct DispatchBackend {
    /// Owned runtime; `None` when running on a borrowed handle.
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    main: Arc<MainQueue>,
    counters: Arc<BackendCounters>,
    shutdown: Arc<AtomicBool>,
    worker_count: usize,
}

impl DispatchBackend {
    /// Build a dedicated runtime described by `config`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] for an invalid configuration,
    /// [`SchedulerError::Spawn`] if the runtime cannot be built.
    pub fn new(config: &ExecutorConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let worker_count = config.effective_worker_count();
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_count)
            .thread_name(format!("{}-dispatch", config.thread_name_prefix))
            .thread_stack_size(config.thread_stack_size)
            .enable_time()
            .build()?;

        info!(worker_count = worker_count, "dispatch global executor initialized");

        let counters = Arc::new(BackendCounters::default());
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            main: MainQueue::new(Arc::clone(&counters)),
            counters,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker_count,
        })
    }

    /// Run on an existing runtime. The runtime must have the time driver
    /// enabled.
    #[must_use]
    pub fn from_handle(handle: Handle) -> Self {
        let worker_count = handle.metrics().num_workers();
        info!(worker_count = worker_count, "dispatch global executor attached to runtime");
        let counters = Arc::new(BackendCounters::default());
        Self {
            runtime: Mutex::new(None),
            handle,
            main: MainQueue::new(Arc::clone(&counters)),
            counters,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker_count,
        }
    }

    /// The main serial queue.
    #[must_use]
    pub const fn main_queue(&self) -> &Arc<MainQueue> {
        &self.main
    }

    fn accept(&self, job: &Job) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            warn!(job_id = job.id(), "dispatch executor shut down, dropping job");
            return false;
        }
        true
    }
}

impl Backend for DispatchBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dispatch
    }

    fn enqueue_global(&self, job: Job) {
        if !self.accept(&job) {
            return;
        }
        self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
        let counters = Arc::clone(&self.counters);
        let shutdown = Arc::clone(&self.shutdown);
        self.handle.spawn(async move {
            run_unless_shut_down(job, &counters, &shutdown);
        });
    }

    fn enqueue_global_with_delay(&self, delay: JobDelay, job: Job) {
        if delay.is_zero() {
            self.enqueue_global(job);
            return;
        }
        if !self.accept(&job) {
            return;
        }
        self.counters.delayed_jobs.fetch_add(1, Ordering::Relaxed);
        debug!(job_id = job.id(), delay_ns = delay.as_nanos(), "arming dispatch timer");
        let counters = Arc::clone(&self.counters);
        let start_at = tokio::time::Instant::from_std(start_time(delay));
        let shutdown = Arc::clone(&self.shutdown);
        self.handle.spawn(async move {
            tokio::time::sleep_until(start_at).await;
            run_unless_shut_down(job, &counters, &shutdown);
        });
    }

    fn enqueue_main(&self, job: Job) {
        self.main.push(job);
    }

    fn main_executor(&self) -> ExecutorRef {
        self.main.executor_ref()
    }

    fn drain_main_queue(&self, mode: DrainMode) -> Result<usize, SchedulerError> {
        self.main.drain(mode)
    }

    fn stats(&self) -> BackendStats {
        self.counters.snapshot(BackendKind::Dispatch, self.worker_count)
    }

    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.main.close();
        // Never blocks, so it is safe from inside an async context
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
        info!("dispatch global executor shut down");
    }
}

/// Run `job` unless the backend was shut down after the task was spawned.
fn run_unless_shut_down(job: Job, counters: &BackendCounters, shutdown: &AtomicBool) {
    if shutdown.load(Ordering::Acquire) {
        warn!(job_id = job.id(), "dispatch executor shut down, dropping pending job");
        return;
    }
    run_job(job, counters);
}

impl Drop for DispatchBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
