//! The main serial queue shared by the thread-based engines.
//!
//! Jobs are delivered through an unbounded channel and run strictly in
//! enqueue order by whichever thread drains the queue. The first draining
//! thread becomes the main thread; later drains from other threads are
//! rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{ExecutorIdentity, ExecutorRef, Job, SchedulerError, SerialExecutor};

use super::{run_job, BackendCounters, DrainMode};

const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Serial executor bound to the program's main thread.
pub struct MainQueue {
    identity: ExecutorIdentity,
    tx: Sender<Job>,
    rx: Receiver<Job>,
    owner: Mutex<Option<ThreadId>>,
    shutdown: AtomicBool,
    counters: Arc<BackendCounters>,
}

impl MainQueue {
    pub(crate) fn new(counters: Arc<BackendCounters>) -> Arc<Self> {
        let (tx, rx) = unbounded();
        Arc::new(Self {
            identity: ExecutorIdentity::unique(),
            tx,
            rx,
            owner: Mutex::new(None),
            shutdown: AtomicBool::new(false),
            counters,
        })
    }

    /// Identity of this queue.
    #[must_use]
    pub const fn identity(&self) -> ExecutorIdentity {
        self.identity
    }

    /// Executor reference to this queue.
    #[must_use]
    pub fn executor_ref(self: &Arc<Self>) -> ExecutorRef {
        ExecutorRef::for_ordinary(self.identity, Arc::clone(self) as Arc<dyn SerialExecutor>)
    }

    /// Append a job.
    pub fn push(&self, job: Job) {
        if self.shutdown.load(Ordering::Acquire) {
            warn!(job_id = job.id(), "main queue shut down, dropping job");
            return;
        }
        self.counters.main_jobs.fetch_add(1, Ordering::Relaxed);
        // The queue owns both channel ends, so send cannot fail
        let _ = self.tx.send(job);
    }

    /// Jobs waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no jobs are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Thread bound as main, if any thread has drained the queue yet.
    #[must_use]
    pub fn main_thread(&self) -> Option<ThreadId> {
        *self.owner.lock()
    }

    fn bind_current_thread(&self) -> Result<(), SchedulerError> {
        let current = thread::current().id();
        let mut owner = self.owner.lock();
        match *owner {
            None => {
                debug!(thread = ?current, "binding main queue to thread");
                *owner = Some(current);
                Ok(())
            }
            Some(id) if id == current => Ok(()),
            Some(_) => Err(SchedulerError::NotMainThread),
        }
    }

    /// Run main jobs on the calling thread.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NotMainThread`] if another thread owns the queue,
    /// [`SchedulerError::Shutdown`] if the queue was closed before the call.
    pub fn drain(&self, mode: DrainMode) -> Result<usize, SchedulerError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(SchedulerError::Shutdown);
        }
        self.bind_current_thread()?;

        let mut ran = 0;
        match mode {
            DrainMode::UntilIdle => {
                while let Ok(job) = self.rx.try_recv() {
                    run_job(job, &self.counters);
                    ran += 1;
                }
            }
            DrainMode::Forever => {
                while !self.shutdown.load(Ordering::Acquire) {
                    match self.rx.recv_timeout(SHUTDOWN_POLL) {
                        Ok(job) => {
                            run_job(job, &self.counters);
                            ran += 1;
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            }
            DrainMode::For(budget) => {
                let until = Instant::now() + budget;
                while !self.shutdown.load(Ordering::Acquire) {
                    match self.rx.recv_deadline(until) {
                        Ok(job) => {
                            run_job(job, &self.counters);
                            ran += 1;
                        }
                        Err(_) => break,
                    }
                }
            }
        }
        Ok(ran)
    }

    /// Stop accepting jobs and wake a `Forever` drain. Pending jobs are dropped.
    pub fn close(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            warn!(dropped = dropped, "main queue closed with pending jobs");
        }
    }
}

impl SerialExecutor for MainQueue {
    fn enqueue(&self, job: Job) {
        self.push(job);
    }
}
