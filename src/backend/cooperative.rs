//! Single-threaded cooperative engine.
//!
//! Enqueues may come from any thread, but jobs only run on the thread that
//! drains the main queue. Global jobs sit in a priority heap (FIFO within a
//! priority), main jobs in a FIFO, delayed jobs in a timer heap polled by the
//! same loop. The loop alternates between main and global work so neither
//! side starves the other.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::core::{ExecutorRef, Job, JobDelay, JobPriority, SchedulerError};

use super::timer::{start_time, TimerHeap};
use super::{run_job, Backend, BackendCounters, BackendKind, BackendStats, DrainMode};

/// Ready job ordered by priority (highest first) and FIFO within priority.
struct ReadyJob {
    priority: JobPriority,
    seq: u64,
    job: Job,
}

impl PartialEq for ReadyJob {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ReadyJob {}

impl PartialOrd for ReadyJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyJob {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        match self.priority.cmp(&other.priority) {
            // FIFO within same priority: lower sequence wins (reversed for max-heap)
            CmpOrdering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

#[derive(Default)]
struct RunQueues {
    ready: BinaryHeap<ReadyJob>,
    main: VecDeque<Job>,
    timers: TimerHeap,
    next_seq: u64,
}

impl RunQueues {
    fn push_ready(&mut self, job: Job) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ready.push(ReadyJob {
            priority: job.priority().effective(),
            seq,
            job,
        });
    }

    fn promote_due(&mut self, now: Instant) {
        while let Some(job) = self.timers.pop_due(now) {
            self.push_ready(job);
        }
    }

    fn next_job(&mut self, prefer_main: bool) -> Option<Job> {
        if prefer_main {
            self.main
                .pop_front()
                .or_else(|| self.ready.pop().map(|r| r.job))
        } else {
            self.ready
                .pop()
                .map(|r| r.job)
                .or_else(|| self.main.pop_front())
        }
    }
}

/// Cooperative run-loop backend.
pub struct CooperativeBackend {
    queues: Mutex<RunQueues>,
    wakeup: Condvar,
    owner: Mutex<Option<ThreadId>>,
    shutdown: AtomicBool,
    counters: Arc<BackendCounters>,
}

impl CooperativeBackend {
    /// Create an idle run loop.
    #[must_use]
    pub fn new() -> Self {
        info!("cooperative global executor initialized");
        Self {
            queues: Mutex::new(RunQueues::default()),
            wakeup: Condvar::new(),
            owner: Mutex::new(None),
            shutdown: AtomicBool::new(false),
            counters: Arc::new(BackendCounters::default()),
        }
    }

    /// Jobs ready to run now (global and main).
    #[must_use]
    pub fn ready_len(&self) -> usize {
        let queues = self.queues.lock();
        queues.ready.len() + queues.main.len()
    }

    /// Jobs waiting on a delay or deadline.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.queues.lock().timers.len()
    }

    fn accept(&self, job: &Job) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            warn!(job_id = job.id(), "cooperative executor shut down, dropping job");
            return false;
        }
        true
    }

    fn bind_current_thread(&self) -> Result<(), SchedulerError> {
        let current = thread::current().id();
        let mut owner = self.owner.lock();
        match *owner {
            None => {
                *owner = Some(current);
                Ok(())
            }
            Some(id) if id == current => Ok(()),
            Some(_) => Err(SchedulerError::NotMainThread),
        }
    }

    fn run_loop(&self, mode: DrainMode) -> usize {
        let until = match mode {
            DrainMode::For(budget) => Some(Instant::now() + budget),
            DrainMode::UntilIdle | DrainMode::Forever => None,
        };
        let mut prefer_main = true;
        let mut ran = 0;

        loop {
            let job = {
                let mut queues = self.queues.lock();
                loop {
                    if self.shutdown.load(Ordering::Acquire) {
                        return ran;
                    }
                    let now = Instant::now();
                    if until.is_some_and(|u| now >= u) {
                        return ran;
                    }
                    queues.promote_due(now);
                    if let Some(job) = queues.next_job(prefer_main) {
                        break job;
                    }

                    // Nothing runnable: sleep until the next timer, the
                    // budget, or an enqueue from another thread.
                    let wake_at = match (queues.timers.next_deadline(), until) {
                        (Some(t), Some(u)) => Some(t.min(u)),
                        (t, u) => t.or(u),
                    };
                    match (wake_at, mode) {
                        (None, DrainMode::UntilIdle) => return ran,
                        (None, _) => self.wakeup.wait(&mut queues),
                        (Some(at), _) => {
                            let _ = self.wakeup.wait_until(&mut queues, at);
                        }
                    }
                }
            };

            run_job(job, &self.counters);
            ran += 1;
            prefer_main = !prefer_main;
        }
    }
}

impl Default for CooperativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CooperativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cooperative
    }

    fn enqueue_global(&self, job: Job) {
        if !self.accept(&job) {
            return;
        }
        self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
        self.queues.lock().push_ready(job);
        self.wakeup.notify_one();
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
        self.queues.lock().timers.push(start_time(delay), job);
        self.wakeup.notify_one();
    }

    fn enqueue_main(&self, job: Job) {
        if !self.accept(&job) {
            return;
        }
        self.counters.main_jobs.fetch_add(1, Ordering::Relaxed);
        self.queues.lock().main.push_back(job);
        self.wakeup.notify_one();
    }

    fn main_executor(&self) -> ExecutorRef {
        // One logical thread runs everything, so main is the generic executor
        ExecutorRef::generic()
    }

    fn drain_main_queue(&self, mode: DrainMode) -> Result<usize, SchedulerError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(SchedulerError::Shutdown);
        }
        self.bind_current_thread()?;
        let ran = self.run_loop(mode);
        debug!(ran = ran, "cooperative drain finished");
        Ok(ran)
    }

    fn stats(&self) -> BackendStats {
        self.counters.snapshot(BackendKind::Cooperative, 0)
    }

    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        // Dropped outside the lock; a dropped capture may enqueue again
        let pending = std::mem::take(&mut *self.queues.lock());
        let dropped = pending.ready.len() + pending.main.len() + pending.timers.len();
        self.wakeup.notify_all();
        drop(pending);
        info!(dropped = dropped, "cooperative global executor shut down");
    }
}
