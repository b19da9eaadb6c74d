//! Integration tests for the main executor.
//!
//! These tests validate:
//! - Main jobs run one at a time, in enqueue order, on the draining thread
//! - The main queue binds to the first thread that drains it
//! - A main executor override receives main jobs and changes identity checks
//! - The override can be installed only once

use global_executor::backend::{Backend, BackendKind, CooperativeBackend, DrainMode, ThreadPoolBackend};
use global_executor::config::ExecutorConfig;
use global_executor::core::{
    ExecutorIdentity, ExecutorRef, GlobalExecutor, Job, SchedulerError, SerialExecutor,
};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// TEST EXECUTORS
// ============================================================================

/// Serial executor that collects jobs and runs them on demand.
#[derive(Default)]
struct CollectingExecutor {
    jobs: Mutex<Vec<Job>>,
}

impl CollectingExecutor {
    fn run_all(&self) -> usize {
        let jobs: Vec<Job> = std::mem::take(&mut *self.jobs.lock());
        let n = jobs.len();
        for job in jobs {
            job.run();
        }
        n
    }

    fn pending(&self) -> usize {
        self.jobs.lock().len()
    }
}

impl SerialExecutor for CollectingExecutor {
    fn enqueue(&self, job: Job) {
        self.jobs.lock().push(job);
    }
}

fn thread_pool_executor() -> GlobalExecutor {
    GlobalExecutor::from_arc(Arc::new(
        ThreadPoolBackend::new(
            &ExecutorConfig::new()
                .with_backend(BackendKind::ThreadPool)
                .with_worker_count(2),
        )
        .unwrap(),
    ))
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn test_main_jobs_fifo_per_producer_on_one_thread() {
    let exec = Arc::new(thread_pool_executor());
    let log = Arc::new(Mutex::new(Vec::new()));
    let thread_ids = Arc::new(Mutex::new(Vec::new()));
    let running = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..4_usize)
        .map(|p| {
            let exec = Arc::clone(&exec);
            let log = Arc::clone(&log);
            let thread_ids = Arc::clone(&thread_ids);
            let running = Arc::clone(&running);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for i in 0..50_usize {
                    let log = Arc::clone(&log);
                    let thread_ids = Arc::clone(&thread_ids);
                    let running = Arc::clone(&running);
                    let overlaps = Arc::clone(&overlaps);
                    exec.enqueue_main(Job::new(move || {
                        if running.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        log.lock().push((p, i));
                        thread_ids.lock().push(thread::current().id());
                        running.store(false, Ordering::SeqCst);
                    }));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(exec.drain_main_queue(DrainMode::UntilIdle).unwrap(), 200);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);

    let me = thread::current().id();
    assert!(thread_ids.lock().iter().all(|id| *id == me));

    let log = log.lock();
    for p in 0..4 {
        let seq: Vec<usize> = log.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
        assert_eq!(seq, (0..50).collect::<Vec<_>>());
    }
    exec.shutdown();
}

#[test]
fn test_main_order_a_b_c_from_three_threads() {
    let exec = Arc::new(thread_pool_executor());
    let log = Arc::new(Mutex::new(Vec::new()));

    // Each thread enqueues only after the previous thread's enqueue returned
    let (a_done, after_a) = crossbeam_channel::bounded::<()>(1);
    let (b_done, after_b) = crossbeam_channel::bounded::<()>(1);
    let steps: Vec<(&str, Option<Receiver<()>>, Option<Sender<()>>)> = vec![
        ("C", Some(after_b), None),
        ("B", Some(after_a), Some(b_done)),
        ("A", None, Some(a_done)),
    ];

    let producers: Vec<_> = steps
        .into_iter()
        .map(|(tag, wait_on, signal)| {
            let exec = Arc::clone(&exec);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                if let Some(rx) = wait_on {
                    rx.recv_timeout(Duration::from_secs(5)).unwrap();
                }
                exec.enqueue_main(Job::new(move || log.lock().push(tag)));
                if let Some(tx) = signal {
                    tx.send(()).unwrap();
                }
                thread::current().id()
            })
        })
        .collect();
    let producer_ids: Vec<_> = producers.into_iter().map(|p| p.join().unwrap()).collect();
    assert_ne!(producer_ids[0], producer_ids[1]);
    assert_ne!(producer_ids[1], producer_ids[2]);

    assert_eq!(exec.drain_main_queue(DrainMode::UntilIdle).unwrap(), 3);
    assert_eq!(*log.lock(), vec!["A", "B", "C"]);
    exec.shutdown();
}

#[test]
fn test_main_job_enqueued_during_drain_runs_after() {
    let exec = Arc::new(thread_pool_executor());
    let log = Arc::new(Mutex::new(Vec::new()));
    let inner_exec = Arc::clone(&exec);
    let l = Arc::clone(&log);
    exec.enqueue_main(Job::new(move || {
        l.lock().push("outer");
        let l = Arc::clone(&l);
        inner_exec.enqueue_main(Job::new(move || l.lock().push("inner")));
    }));
    let l = Arc::clone(&log);
    exec.enqueue_main(Job::new(move || l.lock().push("second")));

    exec.drain_main_queue(DrainMode::UntilIdle).unwrap();
    assert_eq!(*log.lock(), vec!["outer", "second", "inner"]);
    exec.shutdown();
}

#[test]
fn test_second_thread_cannot_drain() {
    let exec = Arc::new(thread_pool_executor());
    exec.drain_main_queue(DrainMode::UntilIdle).unwrap();
    let e = Arc::clone(&exec);
    let result = thread::spawn(move || e.drain_main_queue(DrainMode::For(Duration::from_millis(5))))
        .join()
        .unwrap();
    assert!(matches!(result, Err(SchedulerError::NotMainThread)));
    exec.shutdown();
}

// ============================================================================
// IDENTITY AND OVERRIDE
// ============================================================================

#[test]
fn test_builtin_main_identity() {
    let exec = thread_pool_executor();
    let main = exec.main_executor();
    assert!(!main.is_generic());
    assert!(exec.is_main_executor(&main));
    assert!(!exec.is_main_executor(&ExecutorRef::generic()));
    exec.shutdown();

    let cooperative = GlobalExecutor::new(CooperativeBackend::new());
    assert!(cooperative.is_main_executor(&ExecutorRef::generic()));
}

#[test]
fn test_override_routes_main_jobs_to_new_capabilities() {
    let exec = thread_pool_executor();
    let old = exec.main_executor();

    let caps2 = Arc::new(CollectingExecutor::default());
    let id2 = ExecutorIdentity::unique();
    exec.set_main_executor_override(ExecutorRef::for_ordinary(id2, caps2.clone()))
        .unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    exec.enqueue_main(Job::new(move || {
        r.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(caps2.pending(), 1);
    assert_eq!(exec.stats().main_jobs, 0);
    assert_eq!(caps2.run_all(), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    assert_eq!(exec.main_executor().identity(), id2);
    let same_id: Arc<dyn SerialExecutor> = Arc::new(CollectingExecutor::default());
    assert!(exec.is_main_executor(&ExecutorRef::for_ordinary(id2, same_id)));
    assert!(!exec.is_main_executor(&old));
    exec.shutdown();
}

#[test]
fn test_override_to_builtin_identity_keeps_backend_queue() {
    let exec = thread_pool_executor();
    let builtin = exec.main_executor();
    exec.set_main_executor_override(builtin).unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    exec.enqueue_main(Job::new(move || {
        r.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(exec.stats().main_jobs, 1);
    exec.drain_main_queue(DrainMode::UntilIdle).unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    exec.shutdown();
}

#[test]
fn test_override_only_once() {
    let exec = GlobalExecutor::new(CooperativeBackend::new());
    let first: Arc<dyn SerialExecutor> = Arc::new(CollectingExecutor::default());
    let second: Arc<dyn SerialExecutor> = Arc::new(CollectingExecutor::default());
    let first_id = ExecutorIdentity::unique();

    exec.set_main_executor_override(ExecutorRef::for_ordinary(first_id, first))
        .unwrap();
    let err = exec
        .set_main_executor_override(ExecutorRef::for_ordinary(ExecutorIdentity::unique(), second))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::MainExecutorOverridden));
    assert_eq!(exec.main_executor().identity(), first_id);
}

#[test]
fn test_override_observer_is_notified() {
    let exec = GlobalExecutor::new(CooperativeBackend::new());
    let seen = Arc::new(Mutex::new(None));
    let s = Arc::clone(&seen);
    exec.set_main_executor_hook(Arc::new(move |executor: &ExecutorRef| {
        *s.lock() = Some(executor.identity());
    }));

    let id = ExecutorIdentity::unique();
    let caps: Arc<dyn SerialExecutor> = Arc::new(CollectingExecutor::default());
    exec.set_main_executor_override(ExecutorRef::for_ordinary(id, caps))
        .unwrap();
    assert_eq!(*seen.lock(), Some(id));
    assert_eq!(exec.backend().kind(), BackendKind::Cooperative);
}
