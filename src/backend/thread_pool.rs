//! Portable fallback engine: worker threads, a channel and a timer thread.
//!
//! # Design
//!
//! - **No polling**: workers block on channel recv; the timer thread sleeps
//!   on a Condvar until the earliest start time or a new timer arrives
//! - **Clean shutdown**: stopping the timer thread and dropping the sender
//!   unblocks all workers naturally
//! - **Panic isolation**: a panicking job is logged and counted, the worker
//!   keeps running

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::core::{ExecutorRef, Job, JobDelay, SchedulerError};

use super::main_queue::MainQueue;
use super::timer::{start_time, TimerHeap};
use super::{run_job, Backend, BackendCounters, BackendKind, BackendStats, DrainMode};

/// Timer heap plus the shutdown flag, guarded together so the timer thread
/// never misses a wakeup.
struct TimerState {
    heap: TimerHeap,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    condvar: Condvar,
}

/// Thread-pool backend.
pub struct ThreadPoolBackend {
    /// Job sender (to workers). Option allows clean shutdown by dropping.
    job_tx: Mutex<Option<Sender<Job>>>,
    timers: Arc<TimerShared>,
    main: Arc<MainQueue>,
    counters: Arc<BackendCounters>,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
    timer_thread: Mutex<Option<JoinHandle<()>>>,
    worker_count: usize,
    join_timeout: Duration,
}

impl ThreadPoolBackend {
    /// Start the pool described by `config`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] for an invalid configuration,
    /// [`SchedulerError::Spawn`] if a thread cannot be created.
    pub fn new(config: &ExecutorConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let worker_count = config.effective_worker_count();
        let (job_tx, job_rx) = unbounded::<Job>();
        let counters = Arc::new(BackendCounters::default());
        let timers = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                heap: TimerHeap::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            workers.push(spawn_worker(
                worker_id,
                job_rx.clone(),
                Arc::clone(&counters),
                &config.thread_name_prefix,
                config.thread_stack_size,
            )?);
        }
        let timer_thread = spawn_timer(Arc::clone(&timers), job_tx.clone(), &config.thread_name_prefix)?;

        info!(
            worker_count = worker_count,
            stack_size = config.thread_stack_size,
            "thread pool global executor initialized"
        );

        Ok(Self {
            job_tx: Mutex::new(Some(job_tx)),
            timers,
            main: MainQueue::new(Arc::clone(&counters)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
            timer_thread: Mutex::new(Some(timer_thread)),
            worker_count,
            join_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// The main serial queue.
    #[must_use]
    pub const fn main_queue(&self) -> &Arc<MainQueue> {
        &self.main
    }

    /// Jobs waiting on a delay or deadline.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.timers.state.lock().heap.len()
    }

    fn join_with_timeout(&self, idx: usize, handle: JoinHandle<()>) {
        // Try to join with timeout using a helper thread
        let (tx, rx) = std::sync::mpsc::channel();
        let join_thread = thread::spawn(move || {
            let result = handle.join();
            let _ = tx.send(result.is_ok());
        });

        match rx.recv_timeout(self.join_timeout) {
            Ok(true) => debug!(thread = idx, "backend thread joined"),
            Ok(false) => warn!(thread = idx, "backend thread panicked"),
            Err(_) => {
                warn!(thread = idx, "backend thread did not exit within timeout - detaching");
                return;
            }
        }
        let _ = join_thread.join();
    }
}

impl Backend for ThreadPoolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ThreadPool
    }

    fn enqueue_global(&self, job: Job) {
        let guard = self.job_tx.lock();
        let Some(job_tx) = guard.as_ref() else {
            warn!(job_id = job.id(), "thread pool shut down, dropping job");
            return;
        };
        let job_id = job.id();
        if job_tx.send(job).is_ok() {
            self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
            debug!(job_id = job_id, "job submitted to thread pool");
        } else {
            warn!(job_id = job_id, "thread pool workers gone, job dropped");
        }
    }

    fn enqueue_global_with_delay(&self, delay: JobDelay, job: Job) {
        if delay.is_zero() {
            self.enqueue_global(job);
            return;
        }
        let mut state = self.timers.state.lock();
        if state.shutdown {
            warn!(job_id = job.id(), "thread pool shut down, dropping delayed job");
            return;
        }
        let when = start_time(delay);
        let wake = state.heap.next_deadline().is_none_or(|t| when < t);
        state.heap.push(when, job);
        self.counters.delayed_jobs.fetch_add(1, Ordering::Relaxed);
        drop(state);
        if wake {
            self.timers.condvar.notify_one();
        }
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
        self.counters.snapshot(BackendKind::ThreadPool, self.worker_count)
    }

    /// Shut down gracefully.
    ///
    /// Stops the timer thread (dropping jobs still waiting), closes the main
    /// queue, drops the job sender so idle workers exit, then joins every
    /// thread with the configured per-thread timeout. Threads that do not
    /// exit in time are detached.
    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("shutting down thread pool global executor");

        let pending = {
            let mut state = self.timers.state.lock();
            state.shutdown = true;
            std::mem::take(&mut state.heap)
        };
        self.timers.condvar.notify_all();
        let dropped = pending.len();
        if dropped > 0 {
            warn!(dropped = dropped, "delayed jobs dropped at shutdown");
        }
        // Outside the timer lock; a dropped capture may enqueue again
        drop(pending);
        if let Some(handle) = self.timer_thread.lock().take() {
            self.join_with_timeout(usize::MAX, handle);
        }

        self.main.close();
        *self.job_tx.lock() = None;

        let mut workers = self.workers.lock();
        for (idx, worker) in workers.drain(..).enumerate() {
            self.join_with_timeout(idx, worker);
        }
        info!(worker_count = self.worker_count, "thread pool shut down complete");
    }
}

impl Drop for ThreadPoolBackend {
    fn drop(&mut self) {
        // Signal shutdown but don't join in Drop; explicit shutdown() joins
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.timers.state.lock().shutdown = true;
            self.timers.condvar.notify_all();
            self.main.close();
            *self.job_tx.lock() = None;
            debug!("thread pool dropped without explicit shutdown - threads will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<Job>,
    counters: Arc<BackendCounters>,
    prefix: &str,
    stack_size: usize,
) -> Result<JoinHandle<()>, SchedulerError> {
    let handle = thread::Builder::new()
        .name(format!("{prefix}-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "worker thread started");
            // Blocking recv; returns Err once every sender is dropped
            while let Ok(job) = job_rx.recv() {
                run_job(job, &counters);
            }
            debug!(worker_id = worker_id, "worker thread exiting");
        })?;
    Ok(handle)
}

/// Spawn the timer thread, which moves due jobs onto the worker channel.
fn spawn_timer(
    timers: Arc<TimerShared>,
    job_tx: Sender<Job>,
    prefix: &str,
) -> Result<JoinHandle<()>, SchedulerError> {
    let handle = thread::Builder::new()
        .name(format!("{prefix}-timer"))
        .spawn(move || {
            let mut state = timers.state.lock();
            loop {
                if state.shutdown {
                    break;
                }
                let now = Instant::now();
                let mut due = Vec::new();
                while let Some(job) = state.heap.pop_due(now) {
                    due.push(job);
                }
                if !due.is_empty() {
                    drop(state);
                    for job in due {
                        let _ = job_tx.send(job);
                    }
                    state = timers.state.lock();
                    continue;
                }
                match state.heap.next_deadline() {
                    Some(at) => {
                        let _ = timers.condvar.wait_until(&mut state, at);
                    }
                    None => timers.condvar.wait(&mut state),
                }
            }
            debug!("timer thread exiting");
        })?;
    Ok(handle)
}
